//! `web-sys` implementations of the host services.

use std::future::Future;

use air_dom::{Dom, PageFragment, ScheduledTask, Selector, Timer};
use air_nav::{FetchResponse, Fetcher, History, Location, NavError, NavState, Notifier, Platform};
use air_storage::{KeyValueStore, StorageError, StorageErrorKind, SystemClock};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Document, DomException, DomParser, Element, HtmlElement, HtmlFormElement, HtmlInputElement,
    HtmlSelectElement, HtmlTextAreaElement, RequestCache, RequestInit, Response, Storage,
    SupportedType, Window,
};

/// The live document.
#[derive(Debug, Clone)]
pub struct WebDom {
    document: Document,
    root: Element,
}

impl WebDom {
    /// Wrap `document`. Returns `None` for a document without a root element.
    pub fn new(document: Document) -> Option<Self> {
        let root = document.document_element()?;
        Some(Self { document, root })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn warn_js(operation: &str, error: &JsValue) {
    tracing::warn!(operation, error = ?error, "DOM operation failed");
}

impl Dom for WebDom {
    type Node = Element;

    fn document_element(&self) -> Element {
        self.root.clone()
    }

    fn body(&self) -> Option<Element> {
        self.document.body().map(Element::from)
    }

    fn query(&self, scope: &Element, selector: &Selector) -> Option<Element> {
        scope
            .query_selector(selector.as_str())
            .unwrap_or_else(|e| {
                warn_js("querySelector", &e);
                None
            })
    }

    fn query_all(&self, scope: &Element, selector: &Selector) -> Vec<Element> {
        let list = match scope.query_selector_all(selector.as_str()) {
            Ok(list) => list,
            Err(e) => {
                warn_js("querySelectorAll", &e);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn closest(&self, node: &Element, selector: &Selector) -> Option<Element> {
        node.closest(selector.as_str()).unwrap_or_else(|e| {
            warn_js("closest", &e);
            None
        })
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name().to_ascii_lowercase()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            warn_js("setAttribute", &e);
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            warn_js("classList.add", &e);
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            warn_js("classList.remove", &e);
        }
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        if let Err(e) = element.style().set_property(property, value) {
            warn_js("style.setProperty", &e);
        }
    }

    fn value(&self, node: &Element) -> String {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.value()
        } else if let Some(select) = node.dyn_ref::<HtmlSelectElement>() {
            select.value()
        } else if let Some(area) = node.dyn_ref::<HtmlTextAreaElement>() {
            area.value()
        } else {
            String::new()
        }
    }

    fn is_checked(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlInputElement>()
            .is_some_and(HtmlInputElement::checked)
    }

    fn inner_html(&self, node: &Element) -> String {
        node.inner_html()
    }

    fn set_inner_html(&self, node: &Element, html: &str) {
        node.set_inner_html(html);
    }

    fn text_content(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text_content(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn create_element(&self, tag: &str) -> Element {
        match self.document.create_element(tag) {
            Ok(element) => element,
            Err(e) => {
                warn_js("createElement", &e);
                self.document
                    .create_element("div")
                    .unwrap_or_else(|_| self.root.clone())
            }
        }
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        if let Err(e) = parent.append_child(child) {
            warn_js("appendChild", &e);
        }
    }

    fn prepend_child(&self, parent: &Element, child: &Element) {
        if let Err(e) = parent.prepend_with_node_1(child) {
            warn_js("prepend", &e);
        }
    }

    fn insert_after(&self, reference: &Element, node: &Element) {
        if let Err(e) = reference.after_with_node_1(node) {
            warn_js("after", &e);
        }
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn title(&self) -> String {
        self.document.title()
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn reset_form(&self, form: &Element) {
        if let Some(form) = form.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn parse_page(&self, html: &str, main: &Selector) -> Option<PageFragment> {
        let page = DomParser::new()
            .and_then(|parser| parser.parse_from_string(html, SupportedType::TextHtml))
            .map_err(|e| warn_js("DOMParser.parseFromString", &e))
            .ok()?;
        let region = page.query_selector(main.as_str()).unwrap_or_else(|e| {
            warn_js("querySelector", &e);
            None
        })?;
        let title = page
            .query_selector("title")
            .ok()
            .flatten()
            .map(|_| page.title());
        Some(PageFragment {
            content: region.inner_html(),
            title,
        })
    }
}

fn timeout(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

/// `setTimeout`-backed timer.
#[derive(Debug, Clone)]
pub struct WebTimer {
    window: Window,
}

impl WebTimer {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Timer for WebTimer {
    fn sleep(&self, ms: u32) -> impl Future<Output = ()> {
        let window = self.window.clone();
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Err(e) =
                window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout(ms))
            {
                warn_js("setTimeout", &e);
            }
        });
        async move {
            if let Err(e) = JsFuture::from(promise).await {
                warn_js("sleep", &e);
            }
        }
    }

    fn defer(&self, ms: u32, task: ScheduledTask) {
        let callback = Closure::once_into_js(move || task.run());
        if let Err(e) = self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            timeout(ms),
        ) {
            warn_js("setTimeout", &e);
        }
    }
}

fn network_error(error: &JsValue) -> NavError {
    NavError::Network(
        error
            .as_string()
            .or_else(|| {
                error
                    .dyn_ref::<js_sys::Error>()
                    .map(|e| String::from(e.message()))
            })
            .unwrap_or_else(|| format!("{error:?}")),
    )
}

/// `window.fetch` with caching disabled.
#[derive(Debug, Clone)]
pub struct WebFetcher {
    window: Window,
}

impl WebFetcher {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Fetcher for WebFetcher {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, NavError>> {
        let init = RequestInit::new();
        init.set_method("GET");
        init.set_cache(RequestCache::NoStore);
        let request = self.window.fetch_with_str_and_init(url, &init);
        async move {
            let response: Response = JsFuture::from(request)
                .await
                .map_err(|e| network_error(&e))?
                .dyn_into()
                .map_err(|e| network_error(&e))?;
            let status = response.status();
            let text = response.text().map_err(|e| network_error(&e))?;
            let body = JsFuture::from(text)
                .await
                .map_err(|e| network_error(&e))?
                .as_string()
                .unwrap_or_default();
            Ok(FetchResponse { status, body })
        }
    }
}

/// `window.history` and `window.location`.
#[derive(Debug, Clone)]
pub struct WebHistory {
    window: Window,
}

impl WebHistory {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl History for WebHistory {
    fn location(&self) -> Location {
        let location = self.window.location();
        Location {
            href: location.href().unwrap_or_default(),
            pathname: location.pathname().unwrap_or_default(),
        }
    }

    fn push_state(&self, state: &NavState, url: &str) {
        let data = match serde_json::to_string(state) {
            Ok(json) => js_sys::JSON::parse(&json).unwrap_or(JsValue::NULL),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode history state");
                JsValue::NULL
            }
        };
        let result = self
            .window
            .history()
            .and_then(|history| history.push_state_with_url(&data, "", Some(url)));
        if let Err(e) = result {
            warn_js("history.pushState", &e);
        }
    }
}

/// `window.alert`.
#[derive(Debug, Clone)]
pub struct WebNotifier {
    window: Window,
}

impl WebNotifier {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl Notifier for WebNotifier {
    fn alert(&self, message: &str) {
        if let Err(e) = self.window.alert_with_message(message) {
            warn_js("alert", &e);
        }
    }
}

/// `window.localStorage`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    window: Window,
}

impl LocalStore {
    pub fn new(window: Window) -> Self {
        Self { window }
    }

    fn storage(&self, key: &str) -> Result<Storage, StorageError> {
        match self.window.local_storage() {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(storage_error(StorageErrorKind::Unavailable, key, None)),
            Err(e) => Err(storage_error(StorageErrorKind::Unavailable, key, Some(&e))),
        }
    }
}

fn storage_error(kind: StorageErrorKind, key: &str, error: Option<&JsValue>) -> StorageError {
    let err = StorageError::new(kind)
        .with_backend("LocalStorage")
        .with_key(key);
    match error.and_then(|e| e.dyn_ref::<DomException>()) {
        Some(exception) => err.with_message(exception.message()),
        None => err,
    }
}

fn is_quota_error(error: &JsValue) -> bool {
    error
        .dyn_ref::<DomException>()
        .is_some_and(|e| e.name() == "QuotaExceededError")
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage(key)?
            .get_item(key)
            .map_err(|e| storage_error(StorageErrorKind::Other, key, Some(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage(key)?.set_item(key, value).map_err(|e| {
            let kind = if is_quota_error(&e) {
                StorageErrorKind::QuotaExceeded
            } else {
                StorageErrorKind::Other
            };
            storage_error(kind, key, Some(&e))
        })
    }
}

/// The browser platform.
#[derive(Debug)]
pub struct WebPlatform;

impl Platform for WebPlatform {
    type Dom = WebDom;
    type Timer = WebTimer;
    type Fetcher = WebFetcher;
    type History = WebHistory;
    type Notifier = WebNotifier;
    type Store = LocalStore;
    type Clock = SystemClock;
}
