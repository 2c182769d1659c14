//! Full-screen image viewer.

use std::cell::RefCell;

use air_config::LightboxConfig;
use air_dom::Dom;

/// What the host must do after a lightbox call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightboxEvent<N> {
    /// An overlay was opened. Attach a click listener to `overlay` and a
    /// keydown listener to the document.
    Opened { overlay: N },
    /// The overlay was removed. Detach the keydown listener.
    Closed,
    /// Nothing changed.
    Ignored,
}

/// Single-instance lightbox. Opening a new image closes the current one.
#[derive(Debug)]
pub struct Lightbox<N> {
    config: LightboxConfig,
    current: RefCell<Option<N>>,
}

impl<N: Clone + PartialEq> Lightbox<N> {
    #[must_use]
    pub fn new(config: &LightboxConfig) -> Self {
        Self {
            config: config.clone(),
            current: RefCell::new(None),
        }
    }

    /// The open overlay, if any.
    pub fn current(&self) -> Option<N> {
        self.current.borrow().clone()
    }

    /// Show `image` full screen.
    pub fn open<D: Dom<Node = N>>(&self, dom: &D, image: &N) -> LightboxEvent<N> {
        let Some(body) = dom.body() else {
            tracing::warn!("Document has no body, cannot open lightbox");
            return LightboxEvent::Ignored;
        };
        self.close(dom);

        let overlay = dom.create_element("div");
        dom.add_class(&overlay, &self.config.overlay_class);

        let inner = dom.create_element("div");
        dom.add_class(&inner, &self.config.inner_class);
        dom.set_attribute(&inner, "role", "dialog");
        dom.set_attribute(&inner, "aria-modal", "true");

        let img = dom.create_element("img");
        dom.set_attribute(&img, "src", &dom.attribute(image, "src").unwrap_or_default());
        dom.set_attribute(&img, "alt", &dom.attribute(image, "alt").unwrap_or_default());

        let close = dom.create_element("button");
        dom.add_class(&close, &self.config.close_class);
        dom.set_attribute(&close, "aria-label", &self.config.close_label);
        dom.set_text_content(&close, "✕");

        dom.append_child(&inner, &img);
        dom.append_child(&inner, &close);
        dom.append_child(&overlay, &inner);
        dom.append_child(&body, &overlay);

        *self.current.borrow_mut() = Some(overlay.clone());
        tracing::debug!("Opened lightbox");
        LightboxEvent::Opened { overlay }
    }

    /// Handle a click that landed on `target` inside the overlay.
    ///
    /// Closes on the backdrop itself or the close button; clicks on the
    /// image are ignored.
    pub fn handle_click<D: Dom<Node = N>>(&self, dom: &D, target: &N) -> LightboxEvent<N> {
        let Some(overlay) = self.current() else {
            return LightboxEvent::Ignored;
        };
        if *target == overlay || dom.has_class(target, &self.config.close_class) {
            self.close(dom)
        } else {
            LightboxEvent::Ignored
        }
    }

    /// Handle a keydown while the lightbox is open.
    pub fn handle_key<D: Dom<Node = N>>(&self, dom: &D, key: &str) -> LightboxEvent<N> {
        if key == "Escape" {
            self.close(dom)
        } else {
            LightboxEvent::Ignored
        }
    }

    /// Remove the open overlay.
    pub fn close<D: Dom<Node = N>>(&self, dom: &D) -> LightboxEvent<N> {
        match self.current.borrow_mut().take() {
            Some(overlay) => {
                dom.remove(&overlay);
                tracing::debug!("Closed lightbox");
                LightboxEvent::Closed
            }
            None => LightboxEvent::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use air_dom::{MemoryDom, NodeId};
    use pretty_assertions::assert_eq;

    use super::*;

    fn setup() -> (MemoryDom, Lightbox<NodeId>, NodeId) {
        let dom = MemoryDom::parse(
            r#"<html><body><main><img id="foto" src="img/horta.jpg" alt="Horta"></main></body></html>"#,
        );
        let image = dom.find("#foto").unwrap();
        (dom, Lightbox::new(&LightboxConfig::default()), image)
    }

    #[test]
    fn test_open_builds_overlay() {
        let (dom, lightbox, image) = setup();

        let LightboxEvent::Opened { overlay } = lightbox.open(&dom, &image) else {
            panic!("expected opened");
        };

        assert_eq!(
            dom.outer_html(overlay),
            r#"<div class="pa-lightbox"><div class="pa-lightbox-inner" role="dialog" aria-modal="true"><img src="img/horta.jpg" alt="Horta"><button class="pa-lightbox-close" aria-label="Fechar">✕</button></div></div>"#
        );
        assert_eq!(dom.find_all("body > .pa-lightbox"), vec![overlay]);
    }

    #[test]
    fn test_single_instance() {
        let (dom, lightbox, image) = setup();
        lightbox.open(&dom, &image);
        lightbox.open(&dom, &image);
        assert_eq!(dom.find_all(".pa-lightbox").len(), 1);
    }

    #[test]
    fn test_click_on_overlay_closes() {
        let (dom, lightbox, image) = setup();
        let LightboxEvent::Opened { overlay } = lightbox.open(&dom, &image) else {
            panic!("expected opened");
        };

        let inner_img = dom.find(".pa-lightbox img").unwrap();
        assert_eq!(lightbox.handle_click(&dom, &inner_img), LightboxEvent::Ignored);
        assert!(dom.is_connected(&overlay));

        assert_eq!(lightbox.handle_click(&dom, &overlay), LightboxEvent::Closed);
        assert!(!dom.is_connected(&overlay));
        assert_eq!(lightbox.current(), None);
    }

    #[test]
    fn test_close_button_closes() {
        let (dom, lightbox, image) = setup();
        lightbox.open(&dom, &image);
        let button = dom.find(".pa-lightbox-close").unwrap();
        assert_eq!(lightbox.handle_click(&dom, &button), LightboxEvent::Closed);
        assert_eq!(dom.find_all(".pa-lightbox"), vec![]);
    }

    #[test]
    fn test_escape_closes() {
        let (dom, lightbox, image) = setup();
        lightbox.open(&dom, &image);
        assert_eq!(lightbox.handle_key(&dom, "Enter"), LightboxEvent::Ignored);
        assert_eq!(lightbox.handle_key(&dom, "Escape"), LightboxEvent::Closed);
        assert_eq!(lightbox.handle_key(&dom, "Escape"), LightboxEvent::Ignored);
    }

    #[test]
    fn test_open_without_body_is_ignored() {
        let dom = MemoryDom::parse(r#"<img id="foto" src="a.jpg">"#);
        let image = dom.find("#foto").unwrap();
        let lightbox = Lightbox::new(&LightboxConfig::default());
        assert_eq!(lightbox.open(&dom, &image), LightboxEvent::Ignored);
        assert_eq!(lightbox.current(), None);
    }
}
