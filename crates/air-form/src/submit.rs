//! Registration form submission.

use air_config::{ConfigError, FormConfig};
use air_dom::{Dom, Scheduler, Selector, Timer};
use air_storage::{Clock, KeyValueStore, StorageError, Submission, SubmissionStore};

use crate::flash::{FlashKind, show_message};
use crate::presenter::Presenter;
use crate::schema::FormSchema;
use crate::validator::{Validator, Violation};

/// Submission error.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The registration passed validation but could not be stored.
    #[error("Failed to store registration: {0}")]
    Storage(#[from] StorageError),
}

/// Result of a submit attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; feedback is shown on the form.
    Invalid(Vec<Violation>),
    /// The registration was stored and the form reset.
    Saved(Submission),
}

/// The registration form behavior: locating, binding and submitting.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    config: FormConfig,
    selectors: Vec<Selector>,
    validator: Validator,
    presenter: Presenter,
}

impl RegistrationForm {
    pub fn new(config: &FormConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            config: config.clone(),
            selectors: config.form_selectors()?,
            validator: Validator::new(config),
            presenter: Presenter::new(config),
        })
    }

    /// The registration form inside `scope`, trying each selector in order.
    pub fn find<D: Dom>(&self, dom: &D, scope: &D::Node) -> Option<D::Node> {
        self.selectors
            .iter()
            .find_map(|selector| dom.query(scope, selector))
    }

    /// Resolve the fields of `form`.
    pub fn bind<D: Dom>(&self, dom: &D, form: &D::Node) -> FormSchema<D::Node> {
        FormSchema::bind(dom, form, &self.config)
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Validate and, if valid, store the form's registration.
    ///
    /// On failure the violations are shown inline with an error flash. On
    /// success a success flash is shown, the form is reset and its
    /// conditional sections hidden.
    ///
    /// # Errors
    ///
    /// Returns `SubmitError::Storage` if the store rejects the write. The
    /// user sees an error flash and the form keeps its values.
    pub fn submit<D, T, S, C>(
        &self,
        scheduler: &Scheduler<D, T>,
        store: &SubmissionStore<S, C>,
        schema: &FormSchema<D::Node>,
    ) -> Result<SubmitOutcome, SubmitError>
    where
        D: Dom + 'static,
        D::Node: 'static,
        T: Timer + 'static,
        S: KeyValueStore,
        C: Clock,
    {
        let dom = scheduler.dom();
        let form = schema.form();
        self.presenter.clear(dom, form);

        let values = schema.read(dom);
        let report = self.validator.validate(&values, store.clock().now());
        let registration = match report.into_registration() {
            Ok(registration) => registration,
            Err(violations) => {
                tracing::debug!(count = violations.len(), "Registration form is invalid");
                self.presenter.show(dom, schema, &violations);
                self.flash(scheduler, form, &self.config.error_message, FlashKind::Error);
                return Ok(SubmitOutcome::Invalid(violations));
            }
        };

        let submission = match store.save(registration) {
            Ok(submission) => submission,
            Err(e) => {
                tracing::error!(error = %e, "Failed to store registration");
                self.flash(
                    scheduler,
                    form,
                    &self.config.storage_failure_message,
                    FlashKind::Error,
                );
                return Err(SubmitError::Storage(e));
            }
        };

        self.flash(scheduler, form, &self.config.success_message, FlashKind::Success);
        dom.reset_form(form);
        schema.hide_sections(dom);
        Ok(SubmitOutcome::Saved(submission))
    }

    fn flash<D, T>(&self, scheduler: &Scheduler<D, T>, form: &D::Node, text: &str, kind: FlashKind)
    where
        D: Dom + 'static,
        D::Node: 'static,
        T: Timer + 'static,
    {
        show_message(
            scheduler,
            form,
            text,
            kind,
            self.config.flash_timeout_ms,
            self.config.fade_out_ms,
        );
    }
}
