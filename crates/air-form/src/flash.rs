//! Transient inline messages.

use air_dom::{Dom, Scheduler, Timer};

/// Message style, rendered as the `pa-{kind}` class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Info,
    Success,
    Error,
}

impl FlashKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Prepend a message to `target` and remove it after `timeout_ms`.
///
/// The message gets `pa-fadeout` when the timeout elapses and is detached
/// `fade_out_ms` later. Both steps are owned by the message element, so
/// removing it earlier (or swapping the page) cancels them.
pub fn show_message<D, T>(
    scheduler: &Scheduler<D, T>,
    target: &D::Node,
    text: &str,
    kind: FlashKind,
    timeout_ms: u32,
    fade_out_ms: u32,
) -> D::Node
where
    D: Dom + 'static,
    D::Node: 'static,
    T: Timer + 'static,
{
    let dom = scheduler.dom();
    let message = dom.create_element("div");
    dom.add_class(&message, "pa-message");
    dom.add_class(&message, &format!("pa-{}", kind.as_str()));
    dom.set_attribute(&message, "role", "alert");
    dom.set_text_content(&message, text);
    dom.prepend_child(target, &message);

    scheduler.after(&message, timeout_ms, move |scheduler, message| {
        scheduler.dom().add_class(message, "pa-fadeout");
        scheduler.after(message, fade_out_ms, |scheduler, message| {
            scheduler.dom().remove(message);
        });
    });
    message
}
