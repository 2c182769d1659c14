//! DOM host abstraction for the Projeto Air page controller.
//!
//! The controller never talks to a browser directly. It is written against
//! the [`Dom`] and [`Timer`] traits so the same code drives the live page
//! (through the `air-web` bindings) and in-memory documents in tests.
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Dom`] trait over cloneable element handles, including the host's HTML
//!   parser for fetched pages ([`Dom::parse_page`])
//! - [`Selector`], the CSS subset used by configuration
//! - [`Timer`] with cancellable [`TaskHandle`]s and the owner-scoped
//!   [`TaskRegistry`]
//! - [`ListenerRegistry`], which drops event listeners with their element
//! - `MemoryDom` and `ManualTimer` for tests (behind `mock` feature flag)
//!
//! # Example
//!
//! ```
//! use air_dom::Selector;
//!
//! let selector = Selector::parse("#opcaoDoador input:checked").unwrap();
//! assert_eq!(selector.as_str(), "#opcaoDoador input:checked");
//! ```

#[cfg(any(test, feature = "mock"))]
mod html;
mod listeners;
#[cfg(any(test, feature = "mock"))]
mod memory;
mod selector;
mod timer;

use std::fmt;

pub use listeners::ListenerRegistry;
#[cfg(any(test, feature = "mock"))]
pub use memory::{MemoryDom, NodeId};
pub use selector::{Selector, SelectorError};
#[cfg(any(test, feature = "mock"))]
pub use timer::ManualTimer;
pub use timer::{ScheduledTask, Scheduler, TaskHandle, TaskRegistry, Timer, schedule};

/// Main region and title extracted from a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFragment {
    /// Inner HTML of the main content region.
    pub content: String,
    /// Text of the page's `<title>`, if it declares one.
    pub title: Option<String>,
}

/// Element operations the page controller needs from its host document.
///
/// All methods take `&self`: hosts are single-threaded and mutate through
/// shared handles, like the browser DOM does. Queries search descendants of
/// `scope` only, but selectors match against the whole ancestor chain
/// (`querySelector` semantics).
pub trait Dom {
    /// Element handle. Equality is element identity.
    type Node: Clone + PartialEq + fmt::Debug;

    /// The `<html>` element.
    fn document_element(&self) -> Self::Node;

    /// The `<body>` element, if the document has one.
    fn body(&self) -> Option<Self::Node>;

    /// First descendant of `scope` matching `selector`, in document order.
    fn query(&self, scope: &Self::Node, selector: &Selector) -> Option<Self::Node>;

    /// All descendants of `scope` matching `selector`, in document order.
    fn query_all(&self, scope: &Self::Node, selector: &Selector) -> Vec<Self::Node>;

    /// Closest inclusive ancestor matching `selector`.
    fn closest(&self, node: &Self::Node, selector: &Selector) -> Option<Self::Node>;

    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;
    fn add_class(&self, node: &Self::Node, class: &str);
    fn remove_class(&self, node: &Self::Node, class: &str);

    /// Set an inline style property (e.g. `display`, `cursor`).
    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Current value of a form control (`input`, `select`, `textarea`).
    fn value(&self, node: &Self::Node) -> String;

    /// Current checkedness of a checkbox or radio input.
    fn is_checked(&self, node: &Self::Node) -> bool;

    fn inner_html(&self, node: &Self::Node) -> String;
    fn set_inner_html(&self, node: &Self::Node, html: &str);

    fn text_content(&self, node: &Self::Node) -> String;
    fn set_text_content(&self, node: &Self::Node, text: &str);

    /// Create a detached element.
    fn create_element(&self, tag: &str) -> Self::Node;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node);
    fn prepend_child(&self, parent: &Self::Node, child: &Self::Node);
    /// Insert `node` as the next sibling of `reference`.
    fn insert_after(&self, reference: &Self::Node, node: &Self::Node);
    /// Detach `node` from its parent. No-op when already detached.
    fn remove(&self, node: &Self::Node);

    /// Whether `node` is attached to the document.
    fn is_connected(&self, node: &Self::Node) -> bool;

    fn title(&self) -> String;
    fn set_title(&self, title: &str);

    /// Restore every control in `form` to its default value.
    fn reset_form(&self, form: &Self::Node);

    /// Parse a fetched page in a detached document and extract the inner
    /// HTML of the first element matching `main`, plus the page title.
    ///
    /// The live document is not touched. Returns `None` when nothing
    /// matches `main`.
    fn parse_page(&self, html: &str, main: &Selector) -> Option<PageFragment>;
}

/// Whether a tag names a single form control.
#[must_use]
pub fn is_form_control(tag: &str) -> bool {
    matches!(tag, "input" | "select" | "textarea")
}
