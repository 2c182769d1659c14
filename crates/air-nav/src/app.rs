//! Application context.
//!
//! [`App`] owns everything the page controller keeps between events: the
//! configuration, the host services, the navigation generation counter,
//! the submission store and the open lightbox. Hosts forward DOM events to
//! its methods and act on what they return.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use air_config::{Config, ConfigError};
use air_dom::{Dom, PageFragment, Scheduler, Selector, Timer};
use air_form::{FormSchema, RegistrationForm, SubmitError, SubmitOutcome};
use air_storage::{Submission, SubmissionStore};
use serde_json::{Map, Value};

use crate::behaviors::{Behaviors, Binding};
use crate::host::{FetchResponse, Fetcher, History, Host, NavError, NavState, Notifier, Platform};
use crate::lightbox::{Lightbox, LightboxEvent};
use crate::link::{Click, ClickDecision, LinkPolicy, page_for_path};

/// Element handle of a platform's document.
pub type Node<P> = <<P as Platform>::Dom as Dom>::Node;

/// How a navigation cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavOutcome<N> {
    /// The main region shows the new page. The host must attach `bindings`.
    Swapped { bindings: Vec<Binding<N>> },
    /// A later navigation started before this one finished.
    Superseded,
    /// The current document has no main region to swap into.
    NoTarget,
    /// The page could not be loaded. The user has been alerted.
    Failed(NavError),
}

/// The page controller.
pub struct App<P: Platform> {
    config: Config,
    host: Host<P>,
    scheduler: Scheduler<P::Dom, P::Timer>,
    main: Selector,
    links: Selector,
    policy: LinkPolicy,
    behaviors: Behaviors,
    form: RegistrationForm,
    forms: RefCell<Vec<FormSchema<Node<P>>>>,
    submissions: SubmissionStore<Rc<P::Store>, Rc<P::Clock>>,
    lightbox: Lightbox<Node<P>>,
    generation: Cell<u64>,
    in_flight: Cell<u32>,
}

impl<P: Platform> App<P> {
    /// Validate `config` and build the controller over `host`.
    pub fn new(config: Config, host: Host<P>) -> Result<Self, ConfigError> {
        config.validate()?;
        let scheduler = Scheduler::new(Rc::clone(&host.dom), Rc::clone(&host.timer));
        let submissions = SubmissionStore::new(
            Rc::clone(&host.store),
            Rc::clone(&host.clock),
            config.storage.key.clone(),
        );
        Ok(Self {
            main: config.navigation.main_selector()?,
            links: config.navigation.link_selector()?,
            policy: LinkPolicy::new(&config.navigation),
            behaviors: Behaviors::new(&config)?,
            form: RegistrationForm::new(&config.form)?,
            forms: RefCell::new(Vec::new()),
            lightbox: Lightbox::new(&config.lightbox),
            generation: Cell::new(0),
            in_flight: Cell::new(0),
            submissions,
            scheduler,
            host,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn host(&self) -> &Host<P> {
        &self.host
    }

    pub fn scheduler(&self) -> &Scheduler<P::Dom, P::Timer> {
        &self.scheduler
    }

    fn dom(&self) -> &P::Dom {
        &self.host.dom
    }

    /// Mark the document as enhanced and bind the initial page.
    pub fn mount(&self) -> Vec<Binding<Node<P>>> {
        let root = self.dom().document_element();
        self.dom().add_class(&root, &self.config.navigation.enabled_class);
        tracing::debug!("Page controller mounted");
        self.behaviors.init(self.dom(), &root, &self.form)
    }

    /// Load `url` into the main region, pushing a history entry if `push`.
    ///
    /// Only the most recent call swaps content. Earlier calls still in
    /// flight return [`NavOutcome::Superseded`] once they notice.
    pub async fn navigate(&self, url: &str, push: bool) -> NavOutcome<Node<P>> {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let _loading = LoadingGuard::enter(self);
        tracing::debug!(url, generation, "Loading page");

        let fetched = self.host.fetcher.fetch(url).await;
        if !self.is_current(generation) {
            tracing::debug!(url, generation, "Navigation superseded");
            return NavOutcome::Superseded;
        }
        let fragment = match fetched.and_then(|response| self.extract(response)) {
            Ok(fragment) => fragment,
            Err(e) => return self.fail(url, e),
        };

        let dom = self.dom();
        let Some(main) = dom.query(&dom.document_element(), &self.main) else {
            tracing::warn!(
                selector = %self.config.navigation.main_selector,
                "Current document has no main region"
            );
            return NavOutcome::NoTarget;
        };

        let nav = &self.config.navigation;
        dom.add_class(&main, &nav.exit_class);
        self.scheduler.cancel_owned(&main);
        self.host.timer.sleep(nav.exit_delay_ms).await;
        if !self.is_current(generation) {
            tracing::debug!(url, generation, "Navigation superseded");
            return NavOutcome::Superseded;
        }

        dom.set_inner_html(&main, &fragment.content);
        self.scheduler.prune();
        self.forms
            .borrow_mut()
            .retain(|schema| dom.is_connected(schema.form()));
        dom.remove_class(&main, &nav.exit_class);
        dom.add_class(&main, &nav.enter_class);
        let enter_class = nav.enter_class.clone();
        self.scheduler
            .after(&main, nav.enter_delay_ms, move |scheduler, main| {
                scheduler.dom().remove_class(main, &enter_class);
            });

        if let Some(title) = fragment.title {
            dom.set_title(&title);
        }
        let bindings = self.behaviors.init(dom, &main, &self.form);
        if push {
            self.host.history.push_state(&NavState::new(url), url);
        }
        tracing::debug!(url, bindings = bindings.len(), "Page swapped");
        NavOutcome::Swapped { bindings }
    }

    /// Replay a history entry at `pathname` without pushing.
    pub async fn on_history_navigation(&self, pathname: &str) -> NavOutcome<Node<P>> {
        let page = page_for_path(pathname, &self.config.navigation.home_page);
        self.navigate(&page, false).await
    }

    /// Decide whether a document click starts a client-side navigation.
    pub fn on_click(&self, click: &Click<Node<P>>) -> ClickDecision {
        if !self.policy.accepts_click(click) {
            return ClickDecision::Ignore;
        }
        let Some(link) = self.dom().closest(&click.target, &self.links) else {
            return ClickDecision::Ignore;
        };
        let Some(href) = self.dom().attribute(&link, "href") else {
            return ClickDecision::Ignore;
        };
        if self
            .policy
            .should_intercept(&href, &self.host.history.location())
        {
            ClickDecision::Navigate(href)
        } else {
            ClickDecision::Ignore
        }
    }

    /// Target of a call-to-action button click.
    pub fn on_cta_click(&self, trigger: &Node<P>) -> ClickDecision {
        match self.behaviors.cta_href(self.dom(), trigger) {
            Some(href) => ClickDecision::Navigate(href),
            None => ClickDecision::Ignore,
        }
    }

    /// Validate and store the registration in `form`.
    pub fn submit(&self, form: &Node<P>) -> Result<SubmitOutcome, SubmitError> {
        let mut forms = self.forms.borrow_mut();
        let index = match forms.iter().position(|schema| schema.form() == form) {
            Some(index) => index,
            None => {
                forms.push(self.form.bind(self.dom(), form));
                forms.len() - 1
            }
        };
        self.form
            .submit(&self.scheduler, &self.submissions, &forms[index])
    }

    pub fn open_lightbox(&self, image: &Node<P>) -> LightboxEvent<Node<P>> {
        self.lightbox.open(self.dom(), image)
    }

    pub fn lightbox_click(&self, target: &Node<P>) -> LightboxEvent<Node<P>> {
        self.lightbox.handle_click(self.dom(), target)
    }

    pub fn lightbox_key(&self, key: &str) -> LightboxEvent<Node<P>> {
        self.lightbox.handle_key(self.dom(), key)
    }

    /// Stored registrations.
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.list()
    }

    /// Stored entries as raw JSON, including ones that are not registrations.
    pub fn submission_entries(&self) -> Vec<Value> {
        self.submissions.entries()
    }

    #[allow(clippy::unused_self)]
    pub fn render_template(&self, template: &str, ctx: &Map<String, Value>) -> String {
        air_template::render(template, ctx)
    }

    pub fn storage_key(&self) -> &str {
        self.submissions.key()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    fn extract(&self, response: FetchResponse) -> Result<PageFragment, NavError> {
        if !response.is_success() {
            return Err(NavError::Http(response.status));
        }
        self.dom()
            .parse_page(&response.body, &self.main)
            .ok_or(NavError::ContentMissing)
    }

    fn fail(&self, url: &str, error: NavError) -> NavOutcome<Node<P>> {
        tracing::error!(url, error = %error, "Failed to load page");
        self.host
            .notifier
            .alert(&self.config.navigation.failure_message);
        NavOutcome::Failed(error)
    }
}

/// Loading indicator held by each in-flight navigation.
///
/// The indicator and any leftover exit class are cleared when the last
/// guard drops.
struct LoadingGuard<'a, P: Platform> {
    app: &'a App<P>,
}

impl<'a, P: Platform> LoadingGuard<'a, P> {
    fn enter(app: &'a App<P>) -> Self {
        app.in_flight.set(app.in_flight.get() + 1);
        let dom = app.dom();
        dom.add_class(&dom.document_element(), &app.config.navigation.loading_class);
        Self { app }
    }
}

impl<P: Platform> Drop for LoadingGuard<'_, P> {
    fn drop(&mut self) {
        let app = self.app;
        let remaining = app.in_flight.get().saturating_sub(1);
        app.in_flight.set(remaining);
        if remaining > 0 {
            return;
        }
        let dom = app.dom();
        let root = dom.document_element();
        dom.remove_class(&root, &app.config.navigation.loading_class);
        if let Some(main) = dom.query(&root, &app.main) {
            dom.remove_class(&main, &app.config.navigation.exit_class);
        }
    }
}
