//! Placeholder template rendering for Projeto Air.
//!
//! Templates are plain strings with double-brace placeholders:
//!
//! ```
//! use air_template::render;
//! use serde_json::json;
//!
//! let ctx = json!({ "name": "Ana" });
//! let ctx = ctx.as_object().unwrap();
//! assert_eq!(render("Hello, {{name}}!", ctx), "Hello, Ana!");
//! assert_eq!(render("{{ missing }}", ctx), "");
//! ```
//!
//! # Semantics
//!
//! - Whitespace around the key is trimmed (`{{ name }}` == `{{name}}`).
//! - Absent keys and `null` values render as the empty string.
//! - Rendering is a single pass: substituted values are never re-scanned,
//!   so a value containing `{{other}}` is emitted literally.
//! - No escaping is performed. Output is meant for plain-text contexts.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

/// Matches `{{ key }}`. Non-greedy so adjacent placeholders stay separate.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.+?)\}\}").expect("invalid placeholder regex"));

/// Render a template against a flat JSON object.
///
/// Values are coerced to text with [`value_to_text`].
#[must_use]
pub fn render(template: &str, ctx: &Map<String, Value>) -> String {
    render_with(template, |key| ctx.get(key).and_then(value_to_text))
}

/// Render a template using a lookup closure.
///
/// The closure receives the trimmed key. Returning `None` renders the
/// placeholder as the empty string.
pub fn render_with<'a, F>(template: &str, mut lookup: F) -> String
where
    F: FnMut(&str) -> Option<Cow<'a, str>>,
{
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let key = caps[1].trim();
            lookup(key).map(Cow::into_owned).unwrap_or_default()
        })
        .into_owned()
}

/// Coerce a JSON value to the text substituted into a template.
///
/// Returns `None` for `null`. Arrays are joined with commas (nested `null`
/// elements become empty), objects render as their JSON text.
#[must_use]
pub fn value_to_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Array(items) => Some(Cow::Owned(
            items
                .iter()
                .map(|item| value_to_text(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        )),
        Value::Object(_) => Some(Cow::Owned(value.to_string())),
    }
}
