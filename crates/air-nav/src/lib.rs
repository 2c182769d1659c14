//! Client-side page controller for the Projeto Air site.
//!
//! [`App`] turns the static multi-page site into a single-page experience:
//! internal link clicks fetch the target page and swap its main region in
//! place with exit and enter transitions, history entries are pushed and
//! replayed, and every swap re-binds page behaviors (gallery lightbox,
//! registration form, call-to-action buttons).
//!
//! Everything the controller needs from the browser goes through the
//! [`Platform`] traits. In-memory implementations live in [`mock`] (behind
//! the `mock` feature flag).
//!
//! ```ignore
//! let app = App::new(config, host)?;
//! for binding in app.mount() {
//!     attach_listener(binding);
//! }
//! if let ClickDecision::Navigate(url) = app.on_click(&click) {
//!     app.navigate(&url, true).await;
//! }
//! ```

mod app;
mod behaviors;
mod host;
mod lightbox;
mod link;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use app::{App, NavOutcome, Node};
pub use behaviors::{BOUND_ATTRIBUTE, Behaviors, Binding};
pub use host::{
    FetchResponse, Fetcher, History, Host, Location, NavError, NavState, Notifier, Platform,
};
pub use lightbox::{Lightbox, LightboxEvent};
pub use link::{
    Click, ClickDecision, LinkPolicy, Modifiers, link_host, page_for_path, resolve_link,
};
