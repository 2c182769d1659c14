//! Event wiring and the `window.ProjetoAir` surface.

use std::borrow::Cow;
use std::rc::{Rc, Weak};

use air_config::CONFIG_ELEMENT_ID;
use air_dom::ListenerRegistry;
use air_nav::{
    App, Binding, Click, ClickDecision, History, Host, LightboxEvent, Modifiers, NavOutcome,
};
use air_storage::SystemClock;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{Document, Element, Event, EventTarget, KeyboardEvent, MouseEvent, Window};

use crate::browser::{
    LocalStore, WebDom, WebFetcher, WebHistory, WebNotifier, WebPlatform, WebTimer,
};
use crate::logging::init_logging;
use crate::page_config::load_config;

fn console_sink(line: &str) {
    web_sys::console::log_1(&JsValue::from_str(line));
}

/// An attached event listener. Dropping it detaches the callback.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn attach(
        target: &EventTarget,
        kind: &'static str,
        callback: Closure<dyn FnMut(Event)>,
    ) -> Self {
        listen(target, kind, &callback);
        Self {
            target: target.clone(),
            kind,
            callback,
        }
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let callback = self.callback.as_ref().unchecked_ref();
        if let Err(e) = self.target.remove_event_listener_with_callback(self.kind, callback) {
            tracing::warn!(kind = self.kind, error = ?e, "Failed to remove event listener");
        }
    }
}

/// Live controller plus the listeners it owns.
struct Wiring {
    app: App<WebPlatform>,
    document: Document,
    key_listener: Closure<dyn FnMut(KeyboardEvent)>,
    listeners: ListenerRegistry<Element, Listener>,
}

impl Wiring {
    /// Keep `callback` on `owner` until `owner` leaves the document.
    fn bind(&self, owner: &Element, kind: &'static str, callback: Closure<dyn FnMut(Event)>) {
        self.listeners.add(owner, Listener::attach(owner, kind, callback));
    }

    /// Drop listeners whose element is no longer in the document.
    fn release_detached(&self) {
        let released = self.listeners.prune(self.app.host().dom.as_ref());
        tracing::trace!(released, remaining = self.listeners.len(), "Pruned listeners");
    }
}

/// Prune listeners after the current event handler returns, since the
/// handler itself may belong to an element that was just removed.
fn release_detached_later(wiring: &Rc<Wiring>) {
    let wiring = Rc::downgrade(wiring);
    spawn_local(async move {
        if let Some(wiring) = wiring.upgrade() {
            wiring.release_detached();
        }
    });
}

/// Module entry point.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    init_logging(console_sink);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let dom = WebDom::new(document.clone()).ok_or_else(|| JsValue::from_str("no root element"))?;

    let inline = document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|element| element.text_content());
    let config = load_config(inline.as_deref());

    let host = Host::new(
        dom,
        WebTimer::new(window.clone()),
        WebFetcher::new(window.clone()),
        WebHistory::new(window.clone()),
        WebNotifier::new(window.clone()),
        LocalStore::new(window.clone()),
        SystemClock,
    );
    let app = App::new(config, host).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let wiring = Rc::new_cyclic(|weak: &Weak<Wiring>| {
        let weak = Weak::clone(weak);
        Wiring {
            app,
            document: document.clone(),
            key_listener: Closure::new(move |event: KeyboardEvent| {
                if let Some(wiring) = weak.upgrade() {
                    let outcome = wiring.app.lightbox_key(&event.key());
                    on_lightbox_event(&wiring, outcome);
                }
            }),
            listeners: ListenerRegistry::new(),
        }
    });

    install_api(&window, &wiring)?;

    if document.ready_state() == "loading" {
        let wiring = Rc::clone(&wiring);
        let on_ready = Closure::once_into_js(move || mount(&wiring));
        document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref())?;
    } else {
        mount(&wiring);
    }
    Ok(())
}

fn mount(wiring: &Rc<Wiring>) {
    let bindings = wiring.app.mount();
    attach_all(wiring, bindings);

    let on_click = {
        let wiring = Rc::clone(wiring);
        Closure::<dyn FnMut(MouseEvent)>::new(move |event: MouseEvent| {
            let Some(target) = event_target(&event) else {
                return;
            };
            let click = Click {
                target,
                button: event.button(),
                default_prevented: event.default_prevented(),
                modifiers: Modifiers {
                    meta: event.meta_key(),
                    ctrl: event.ctrl_key(),
                    shift: event.shift_key(),
                    alt: event.alt_key(),
                },
            };
            if let ClickDecision::Navigate(url) = wiring.app.on_click(&click) {
                event.prevent_default();
                spawn_navigation(&wiring, url, true);
            }
        })
    };
    listen(&wiring.document, "click", &on_click);
    on_click.forget();

    let on_popstate = {
        let wiring = Rc::clone(wiring);
        Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
            let pathname = wiring.app.host().history.location().pathname;
            let wiring = Rc::clone(&wiring);
            spawn_local(async move {
                let outcome = wiring.app.on_history_navigation(&pathname).await;
                finish_navigation(&wiring, outcome);
            });
        })
    };
    if let Some(window) = web_sys::window() {
        listen(&window, "popstate", &on_popstate);
    }
    on_popstate.forget();
}

fn event_target(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

fn listen<T: WasmClosure + ?Sized>(target: &EventTarget, kind: &str, closure: &Closure<T>) {
    let callback = closure.as_ref().unchecked_ref();
    if let Err(e) = target.add_event_listener_with_callback(kind, callback) {
        tracing::warn!(kind, error = ?e, "Failed to add event listener");
    }
}

fn spawn_navigation(wiring: &Rc<Wiring>, url: String, push: bool) {
    let wiring = Rc::clone(wiring);
    spawn_local(async move {
        let outcome = wiring.app.navigate(&url, push).await;
        finish_navigation(&wiring, outcome);
    });
}

fn finish_navigation(wiring: &Rc<Wiring>, outcome: NavOutcome<Element>) {
    if let NavOutcome::Swapped { bindings } = outcome {
        wiring.release_detached();
        attach_all(wiring, bindings);
    }
}

fn attach_all(wiring: &Rc<Wiring>, bindings: Vec<Binding<Element>>) {
    for binding in bindings {
        attach(wiring, binding);
    }
}

fn attach(wiring: &Rc<Wiring>, binding: Binding<Element>) {
    let weak = Rc::downgrade(wiring);
    match binding {
        Binding::Lightbox { image } => {
            let target = image.clone();
            let handler = Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                if let Some(wiring) = weak.upgrade() {
                    let outcome = wiring.app.open_lightbox(&target);
                    on_lightbox_event(&wiring, outcome);
                }
            });
            wiring.bind(&image, "click", handler);
        }
        Binding::Submit { form } => {
            let target = form.clone();
            let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                event.prevent_default();
                let Some(wiring) = weak.upgrade() else {
                    return;
                };
                if let Err(e) = wiring.app.submit(&target) {
                    tracing::debug!(error = %e, "Registration not stored");
                }
            });
            wiring.bind(&form, "submit", handler);
        }
        Binding::Navigate { trigger, .. } => {
            let target = trigger.clone();
            let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                let Some(wiring) = weak.upgrade() else {
                    return;
                };
                if let ClickDecision::Navigate(url) = wiring.app.on_cta_click(&target) {
                    event.prevent_default();
                    spawn_navigation(&wiring, url, true);
                }
            });
            wiring.bind(&trigger, "click", handler);
        }
    }
}

fn on_lightbox_event(wiring: &Rc<Wiring>, event: LightboxEvent<Element>) {
    let key_listener = wiring.key_listener.as_ref().unchecked_ref();
    match event {
        LightboxEvent::Opened { overlay } => {
            release_detached_later(wiring);
            let weak = Rc::downgrade(wiring);
            let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                let (Some(wiring), Some(target)) = (weak.upgrade(), event_target(&event)) else {
                    return;
                };
                let outcome = wiring.app.lightbox_click(&target);
                on_lightbox_event(&wiring, outcome);
            });
            wiring.bind(&overlay, "click", handler);
            if let Err(e) = wiring
                .document
                .add_event_listener_with_callback("keydown", key_listener)
            {
                tracing::warn!(error = ?e, "Failed to add keydown listener");
            }
        }
        LightboxEvent::Closed => {
            release_detached_later(wiring);
            if let Err(e) = wiring
                .document
                .remove_event_listener_with_callback("keydown", key_listener)
            {
                tracing::warn!(error = ?e, "Failed to remove keydown listener");
            }
        }
        LightboxEvent::Ignored => {}
    }
}

/// Text form of a JS value for template substitution.
fn js_text(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    if let Some(text) = value.as_string() {
        return Some(text);
    }
    js_sys::JSON::stringify(value).ok().map(String::from)
}

fn install_api(window: &Window, wiring: &Rc<Wiring>) -> Result<(), JsValue> {
    let api = js_sys::Object::new();

    let load_page = {
        let wiring = Rc::clone(wiring);
        Closure::<dyn Fn(JsValue, JsValue) -> js_sys::Promise>::new(
            move |url: JsValue, push: JsValue| {
                let wiring = Rc::clone(&wiring);
                let url = url.as_string().unwrap_or_default();
                let push = push.as_bool().unwrap_or(true);
                future_to_promise(async move {
                    let outcome = wiring.app.navigate(&url, push).await;
                    let swapped = matches!(outcome, NavOutcome::Swapped { .. });
                    finish_navigation(&wiring, outcome);
                    Ok(JsValue::from_bool(swapped))
                })
            },
        )
    };
    js_sys::Reflect::set(&api, &"loadPage".into(), load_page.as_ref())?;
    load_page.forget();

    let get_submissions = {
        let wiring = Rc::clone(wiring);
        Closure::<dyn Fn() -> JsValue>::new(move || {
            let entries = wiring.app.submission_entries();
            serde_json::to_string(&entries)
                .ok()
                .and_then(|json| js_sys::JSON::parse(&json).ok())
                .unwrap_or_else(|| js_sys::Array::new().into())
        })
    };
    js_sys::Reflect::set(&api, &"getSubmissions".into(), get_submissions.as_ref())?;
    get_submissions.forget();

    let render_template = Closure::<dyn Fn(JsValue, JsValue) -> String>::new(
        |template: JsValue, ctx: JsValue| {
            let template = template.as_string().unwrap_or_default();
            if ctx.is_undefined() || ctx.is_null() {
                return air_template::render_with(&template, |_| None);
            }
            air_template::render_with(&template, |key| {
                let value = js_sys::Reflect::get(&ctx, &JsValue::from_str(key)).ok()?;
                js_text(&value).map(Cow::Owned)
            })
        },
    );
    js_sys::Reflect::set(&api, &"renderTemplate".into(), render_template.as_ref())?;
    render_template.forget();

    js_sys::Reflect::set(
        &api,
        &"STORAGE_KEY".into(),
        &JsValue::from_str(wiring.app.storage_key()),
    )?;
    js_sys::Reflect::set(window, &"ProjetoAir".into(), &api)?;
    tracing::debug!("Installed window.ProjetoAir");
    Ok(())
}
