//! Scripted host services for testing.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::{Future, poll_fn};
use std::rc::Rc;
use std::task::{Poll, Waker};

use air_dom::{ManualTimer, MemoryDom};
use air_storage::{FixedClock, MemoryStore};
use url::Url;

use crate::host::{
    FetchResponse, Fetcher, History, Host, Location, NavError, NavState, Notifier, Platform,
};

#[derive(Debug, Default)]
struct Gate {
    open: Cell<bool>,
    waker: RefCell<Option<Waker>>,
}

impl Gate {
    fn release(&self) {
        self.open.set(true);
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }

    async fn wait(&self) {
        poll_fn(|cx| {
            if self.open.get() {
                Poll::Ready(())
            } else {
                *self.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        })
        .await;
    }
}

/// [`Fetcher`] answering from a fixed table.
///
/// Unknown URLs answer `404`. A held URL stays pending until released,
/// which lets tests interleave navigation cycles.
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    pages: RefCell<HashMap<String, Result<FetchResponse, NavError>>>,
    gates: RefCell<HashMap<String, Rc<Gate>>>,
    requests: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`.
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.respond(url, Ok(FetchResponse::ok(body)));
        self
    }

    /// Answer `url` with `result`.
    pub fn respond(&self, url: impl Into<String>, result: Result<FetchResponse, NavError>) {
        self.pages.borrow_mut().insert(url.into(), result);
    }

    /// Keep requests for `url` pending until [`release`](Self::release).
    pub fn hold(&self, url: impl Into<String>) {
        self.gates.borrow_mut().insert(url.into(), Rc::new(Gate::default()));
    }

    /// Let held requests for `url` complete.
    pub fn release(&self, url: &str) {
        if let Some(gate) = self.gates.borrow_mut().remove(url) {
            gate.release();
        }
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, NavError>> {
        self.requests.borrow_mut().push(url.to_owned());
        let gate = self.gates.borrow().get(url).map(Rc::clone);
        let url = url.to_owned();
        async move {
            if let Some(gate) = gate {
                gate.wait().await;
            }
            self.pages
                .borrow()
                .get(&url)
                .cloned()
                .unwrap_or(Ok(FetchResponse {
                    status: 404,
                    body: String::new(),
                }))
        }
    }
}

/// [`History`] that records pushed entries.
#[derive(Debug)]
pub struct RecordingHistory {
    location: RefCell<Location>,
    pushes: RefCell<Vec<(NavState, String)>>,
}

impl RecordingHistory {
    /// History positioned at the absolute URL `href`.
    ///
    /// # Panics
    ///
    /// If `href` is not an absolute URL.
    #[must_use]
    pub fn new(href: &str) -> Self {
        let url = Url::parse(href).expect("history needs an absolute URL");
        Self {
            location: RefCell::new(Location {
                href: url.to_string(),
                pathname: url.path().to_owned(),
            }),
            pushes: RefCell::new(Vec::new()),
        }
    }

    /// Pushed `(state, url)` pairs, in order.
    #[must_use]
    pub fn pushes(&self) -> Vec<(NavState, String)> {
        self.pushes.borrow().clone()
    }
}

impl History for RecordingHistory {
    fn location(&self) -> Location {
        self.location.borrow().clone()
    }

    fn push_state(&self, state: &NavState, url: &str) {
        let mut location = self.location.borrow_mut();
        if let Some(next) = Url::parse(&location.href).and_then(|base| base.join(url)).ok() {
            location.pathname = next.path().to_owned();
            location.href = next.to_string();
        }
        self.pushes.borrow_mut().push((state.clone(), url.to_owned()));
    }
}

/// [`Notifier`] that records alerts.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: RefCell<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_owned());
    }
}

/// In-memory platform.
#[derive(Debug)]
pub struct MockPlatform;

impl Platform for MockPlatform {
    type Dom = MemoryDom;
    type Timer = ManualTimer;
    type Fetcher = ScriptedFetcher;
    type History = RecordingHistory;
    type Notifier = RecordingNotifier;
    type Store = MemoryStore;
    type Clock = FixedClock;
}

/// Mock host showing `html` at `https://projetoair.org/index.html`.
#[must_use]
pub fn mock_host(html: &str, fetcher: ScriptedFetcher, clock: FixedClock) -> Host<MockPlatform> {
    Host::new(
        MemoryDom::parse(html),
        ManualTimer::new(),
        fetcher,
        RecordingHistory::new("https://projetoair.org/index.html"),
        RecordingNotifier::new(),
        MemoryStore::new(),
        clock,
    )
}
