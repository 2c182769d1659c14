#![forbid(unsafe_code)]

//! Browser entry point for the Projeto Air page controller.
//!
//! On `wasm32` this crate implements the [`air_nav::Platform`] services over
//! `web-sys`, wires DOM events to [`air_nav::App`], and installs the
//! `window.ProjetoAir` object:
//!
//! - `loadPage(url, push = true)` loads a page into the main region
//! - `getSubmissions()` returns the stored registrations
//! - `renderTemplate(str, ctx)` substitutes `{{ key }}` placeholders
//! - `STORAGE_KEY` names the localStorage key
//!
//! Configuration is read from an inline TOML block
//! (`<script type="application/toml" id="projeto-air-config">`). Native
//! builds only compile the platform-independent pieces so the workspace
//! checks and tests on any target.

mod logging;
mod page_config;

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
mod wasm;

pub use logging::{ConsoleWriter, init_logging, subscriber};
pub use page_config::load_config;

#[cfg(target_arch = "wasm32")]
pub use browser::{
    LocalStore, WebDom, WebFetcher, WebHistory, WebNotifier, WebPlatform, WebTimer,
};
