//! Inline validation feedback.

use air_config::FormConfig;
use air_dom::{Dom, Selector, is_form_control};

use crate::schema::FormSchema;
use crate::validator::Violation;

/// Marks invalid controls and places error messages next to them.
#[derive(Debug, Clone)]
pub struct Presenter {
    invalid_class: String,
    error_class: String,
    controls: Option<Selector>,
}

impl Presenter {
    #[must_use]
    pub fn new(config: &FormConfig) -> Self {
        Self {
            invalid_class: config.invalid_class.clone(),
            error_class: config.error_class.clone(),
            controls: Selector::parse("input, select, textarea").ok(),
        }
    }

    /// Remove every message and invalid marker inside `form`.
    pub fn clear<D: Dom>(&self, dom: &D, form: &D::Node) {
        if let Ok(errors) = Selector::parse(&format!(".{}", self.error_class)) {
            for node in dom.query_all(form, &errors) {
                dom.remove(&node);
            }
        }
        if let Ok(invalid) = Selector::parse(&format!(".{}", self.invalid_class)) {
            for node in dom.query_all(form, &invalid) {
                dom.remove_class(&node, &self.invalid_class);
            }
        }
    }

    /// Replace the form's feedback with `violations`.
    pub fn show<D: Dom>(&self, dom: &D, schema: &FormSchema<D::Node>, violations: &[Violation]) {
        let form = schema.form();
        self.clear(dom, form);

        for violation in violations {
            let message = self.message(dom, &violation.message);
            let Some(field) = schema.node(violation.field) else {
                dom.prepend_child(form, &message);
                continue;
            };

            if is_form_control(&dom.tag_name(field)) {
                dom.add_class(field, &self.invalid_class);
                dom.insert_after(field, &message);
                continue;
            }

            let first_control = self
                .controls
                .as_ref()
                .and_then(|controls| dom.query(field, controls));
            if let Some(control) = first_control {
                dom.add_class(&control, &self.invalid_class);
            }
            dom.append_child(field, &message);
        }
    }

    fn message<D: Dom>(&self, dom: &D, text: &str) -> D::Node {
        let message = dom.create_element("div");
        dom.add_class(&message, &self.error_class);
        dom.set_attribute(&message, "role", "alert");
        dom.set_text_content(&message, text);
        message
    }
}
