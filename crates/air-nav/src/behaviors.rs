//! Behaviors attached to page content.
//!
//! After mount and after every content swap the controller scans the new
//! content and asks the host to attach listeners for what it finds. Each
//! bound element is marked with `data-pa-bound` so scanning the same
//! element twice never yields a second listener.

use air_config::{Config, ConfigError};
use air_dom::{Dom, Selector};
use air_form::RegistrationForm;

use crate::link::LinkPolicy;

/// Attribute listing the binding kinds already attached to an element.
pub const BOUND_ATTRIBUTE: &str = "data-pa-bound";

/// A listener the host must attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding<N> {
    /// Click on a gallery image opens the lightbox.
    Lightbox { image: N },
    /// Submit of the registration form runs validation.
    Submit { form: N },
    /// Click on a call-to-action button navigates to `href`.
    Navigate { trigger: N, href: String },
}

impl<N> Binding<N> {
    /// Kind name stored in the bound marker.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lightbox { .. } => "lightbox",
            Self::Submit { .. } => "submit",
            Self::Navigate { .. } => "navigate",
        }
    }

    /// The element the listener goes on.
    pub fn element(&self) -> &N {
        match self {
            Self::Lightbox { image } => image,
            Self::Submit { form } => form,
            Self::Navigate { trigger, .. } => trigger,
        }
    }
}

/// Scans content for elements that need listeners.
#[derive(Debug, Clone)]
pub struct Behaviors {
    images: Selector,
    cta: Selector,
    links: LinkPolicy,
}

impl Behaviors {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            images: config.lightbox.image_selector()?,
            cta: config.behaviors.cta_selector()?,
            links: LinkPolicy::new(&config.navigation),
        })
    }

    /// Collect the bindings for `scope`, skipping elements already bound.
    pub fn init<D: Dom>(
        &self,
        dom: &D,
        scope: &D::Node,
        form: &RegistrationForm,
    ) -> Vec<Binding<D::Node>> {
        let mut bindings = Vec::new();

        for image in dom.query_all(scope, &self.images) {
            dom.set_style(&image, "cursor", "zoom-in");
            bindings.push(Binding::Lightbox { image });
        }

        if let Some(form) = form.find(dom, scope) {
            bindings.push(Binding::Submit { form });
        }

        for trigger in dom.query_all(scope, &self.cta) {
            if let Some(href) = self.cta_href(dom, &trigger) {
                bindings.push(Binding::Navigate { trigger, href });
            }
        }

        bindings.retain(|binding| mark_bound(dom, binding.element(), binding.kind()));
        tracing::debug!(count = bindings.len(), "Bound page behaviors");
        bindings
    }

    /// Page a call-to-action button points at, read from `href` or
    /// `data-href`.
    pub fn cta_href<D: Dom>(&self, dom: &D, trigger: &D::Node) -> Option<String> {
        dom.attribute(trigger, "href")
            .filter(|href| !href.is_empty())
            .or_else(|| dom.attribute(trigger, "data-href"))
            .filter(|href| self.links.is_page(href))
    }
}

/// Record `kind` on `node`. Returns false if it was already recorded.
fn mark_bound<D: Dom>(dom: &D, node: &D::Node, kind: &str) -> bool {
    let existing = dom.attribute(node, BOUND_ATTRIBUTE).unwrap_or_default();
    if existing.split_whitespace().any(|k| k == kind) {
        return false;
    }
    let marker = if existing.trim().is_empty() {
        kind.to_owned()
    } else {
        format!("{} {kind}", existing.trim())
    };
    dom.set_attribute(node, BOUND_ATTRIBUTE, &marker);
    true
}
