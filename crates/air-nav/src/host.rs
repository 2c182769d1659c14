//! Host services the navigation controller depends on.
//!
//! The browser binding implements these over `fetch`, `history` and
//! `window.alert`; tests use the recording implementations in [`crate::mock`].

use std::future::Future;
use std::rc::Rc;

use air_dom::{Dom, Timer};
use air_storage::{Clock, KeyValueStore};
use serde::{Deserialize, Serialize};

/// Navigation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    /// The request did not complete.
    #[error("Network error: {0}")]
    Network(String),
    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Http(u16),
    /// The fetched page has no main content region.
    #[error("Content not found in page")]
    ContentMissing,
}

/// A fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    /// A `200 OK` response.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Same-origin page fetcher.
pub trait Fetcher {
    /// GET `url`, bypassing caches.
    ///
    /// Non-success statuses are returned as responses, not errors.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, NavError>>;
}

/// Current document location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    /// Full document URL (`https://example.org:8080/projetos.html`).
    pub href: String,
    /// Path component (`/projetos.html`).
    pub pathname: String,
}

/// State stored with history entries created by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    pub spa: bool,
    pub url: String,
}

impl NavState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            spa: true,
            url: url.into(),
        }
    }
}

/// Session history.
pub trait History {
    fn location(&self) -> Location;

    /// Push a new entry for `url`.
    fn push_state(&self, state: &NavState, url: &str);
}

/// Blocking user notification.
pub trait Notifier {
    fn alert(&self, message: &str);
}

/// Concrete host types for one environment.
pub trait Platform: 'static {
    type Dom: Dom<Node: 'static> + 'static;
    type Timer: Timer + 'static;
    type Fetcher: Fetcher;
    type History: History;
    type Notifier: Notifier;
    type Store: KeyValueStore;
    type Clock: Clock;
}

/// Host service instances.
pub struct Host<P: Platform> {
    pub dom: Rc<P::Dom>,
    pub timer: Rc<P::Timer>,
    pub fetcher: P::Fetcher,
    pub history: P::History,
    pub notifier: P::Notifier,
    pub store: Rc<P::Store>,
    pub clock: Rc<P::Clock>,
}

impl<P: Platform> Host<P> {
    pub fn new(
        dom: P::Dom,
        timer: P::Timer,
        fetcher: P::Fetcher,
        history: P::History,
        notifier: P::Notifier,
        store: P::Store,
        clock: P::Clock,
    ) -> Self {
        Self {
            dom: Rc::new(dom),
            timer: Rc::new(timer),
            fetcher,
            history,
            notifier,
            store: Rc::new(store),
            clock: Rc::new(clock),
        }
    }
}
