//! Configuration management for Projeto Air.
//!
//! Every constant the page controller relies on (selectors, delays, class
//! names, storage key, user-facing messages) lives here, parsed from TOML
//! with serde. Each section falls back to defaults that match the site's
//! stock markup, so an empty document is a valid configuration.
//!
//! In the browser the configuration is read from an inline
//! `<script type="application/toml" id="projeto-air-config">` element.
//!
//! ```
//! let config = air_config::Config::from_toml_str(
//!     "[navigation]\nexit_delay_ms = 100\n",
//! ).unwrap();
//! assert_eq!(config.navigation.exit_delay_ms, 100);
//! assert_eq!(config.storage.key, "projetoAir_submissions_v1");
//! ```

use air_dom::{Selector, SelectorError};
use serde::Deserialize;

/// Id of the inline element carrying page-supplied configuration.
pub const CONFIG_ELEMENT_ID: &str = "projeto-air-config";

/// Upper bound for every configurable delay.
const MAX_DELAY_MS: u32 = 10_000;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Client-side navigation.
    pub navigation: NavigationConfig,
    /// Submission storage.
    pub storage: StorageConfig,
    /// Registration form.
    pub form: FormConfig,
    /// Image lightbox.
    pub lightbox: LightboxConfig,
    /// Behaviors re-bound after every content swap.
    pub behaviors: BehaviorsConfig,
}

/// Client-side navigation configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Main content region swapped on navigation.
    pub main_selector: String,
    /// Elements whose clicks are considered for interception.
    pub link_selector: String,
    /// Page loaded when the history path has no last segment.
    pub home_page: String,
    /// Suffixes that mark an href as an internal page.
    pub page_extensions: Vec<String>,
    /// Time the exit transition runs before content is replaced.
    pub exit_delay_ms: u32,
    /// Time the enter transition class stays on the main region.
    pub enter_delay_ms: u32,
    /// Class on the document element while a page is loading.
    pub loading_class: String,
    /// Class on the document element once the controller is mounted.
    pub enabled_class: String,
    /// Class on the main region during the exit transition.
    pub exit_class: String,
    /// Class on the main region during the enter transition.
    pub enter_class: String,
    /// Alert shown when a page cannot be loaded.
    pub failure_message: String,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            main_selector: "main".to_owned(),
            link_selector: "a[href]".to_owned(),
            home_page: "index.html".to_owned(),
            page_extensions: vec![".html".to_owned()],
            exit_delay_ms: 180,
            enter_delay_ms: 350,
            loading_class: "pa-loading".to_owned(),
            enabled_class: "pa-spa-enabled".to_owned(),
            exit_class: "pa-exit".to_owned(),
            enter_class: "pa-enter".to_owned(),
            failure_message: "Falha ao carregar a página. Verifique a URL ou o servidor \
                              (no modo local use HTTP)."
                .to_owned(),
        }
    }
}

impl NavigationConfig {
    /// Whether `href` ends with one of the page extensions.
    #[must_use]
    pub fn is_page(&self, href: &str) -> bool {
        self.page_extensions.iter().any(|ext| href.ends_with(ext))
    }

    pub fn main_selector(&self) -> Result<Selector, ConfigError> {
        parse_selector(&self.main_selector, "navigation.main_selector")
    }

    pub fn link_selector(&self) -> Result<Selector, ConfigError> {
        parse_selector(&self.link_selector, "navigation.link_selector")
    }
}

/// Submission storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Key holding the submission list.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            key: "projetoAir_submissions_v1".to_owned(),
        }
    }
}

/// Registration form configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Candidate selectors for the registration form, in priority order.
    pub selectors: Vec<String>,
    /// Ids (or names) of the form controls.
    pub fields: FormFieldsConfig,
    /// Id of the volunteer areas section.
    pub volunteer_section: String,
    /// Id of the donation method section.
    pub donor_section: String,
    /// Minimum name length in characters.
    pub min_name_len: usize,
    /// Minimum digits in the contact phone.
    pub min_phone_digits: usize,
    /// Minimum age in years.
    pub min_age: u32,
    /// Class marking an invalid control.
    pub invalid_class: String,
    /// Class of inline field error messages.
    pub error_class: String,
    /// Flash shown when validation fails.
    pub error_message: String,
    /// Flash shown after a successful registration.
    pub success_message: String,
    /// Flash shown when the registration could not be stored.
    pub storage_failure_message: String,
    /// How long a flash message stays before fading.
    pub flash_timeout_ms: u32,
    /// Fade-out duration before a flash message is removed.
    pub fade_out_ms: u32,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            selectors: vec![
                r##"form[action="#"], form[action=""]"##.to_owned(),
                ".formulario form".to_owned(),
                "form".to_owned(),
            ],
            fields: FormFieldsConfig::default(),
            volunteer_section: "opcaoVoluntario".to_owned(),
            donor_section: "opcaoDoador".to_owned(),
            min_name_len: 3,
            min_phone_digits: 10,
            min_age: 6,
            invalid_class: "pa-invalid".to_owned(),
            error_class: "pa-field-error".to_owned(),
            error_message: "Corrija os campos destacados e tente novamente.".to_owned(),
            success_message: "Cadastro registrado com sucesso. Obrigado pela contribuição!"
                .to_owned(),
            storage_failure_message:
                "Não foi possível salvar o cadastro neste navegador. Tente novamente.".to_owned(),
            flash_timeout_ms: 6000,
            fade_out_ms: 500,
        }
    }
}

impl FormConfig {
    /// Compile the form selectors, keeping their priority order.
    pub fn form_selectors(&self) -> Result<Vec<Selector>, ConfigError> {
        self.selectors
            .iter()
            .map(|s| parse_selector(s, "form.selectors"))
            .collect()
    }
}

/// Identifiers of the registration form controls.
///
/// Each control is looked up by `#id` first, then by `[name=...]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormFieldsConfig {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub birth_date: String,
    pub region: String,
    pub mode: String,
}

impl Default for FormFieldsConfig {
    fn default() -> Self {
        Self {
            name: "nome".to_owned(),
            email: "email".to_owned(),
            contact: "contato".to_owned(),
            birth_date: "nascimento".to_owned(),
            region: "uf".to_owned(),
            mode: "formaContribuicao".to_owned(),
        }
    }
}

impl FormFieldsConfig {
    fn entries(&self) -> [(&str, &str); 6] {
        [
            (self.name.as_str(), "form.fields.name"),
            (self.email.as_str(), "form.fields.email"),
            (self.contact.as_str(), "form.fields.contact"),
            (self.birth_date.as_str(), "form.fields.birth_date"),
            (self.region.as_str(), "form.fields.region"),
            (self.mode.as_str(), "form.fields.mode"),
        ]
    }
}

/// Image lightbox configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LightboxConfig {
    /// Images that open in the lightbox.
    pub image_selector: String,
    /// Class of the full-screen overlay.
    pub overlay_class: String,
    /// Class of the dialog inside the overlay.
    pub inner_class: String,
    /// Class of the close button.
    pub close_class: String,
    /// Accessible label of the close button.
    pub close_label: String,
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            image_selector:
                ".galeria-container img, .cards-projetos img, .cards-impacto img, .img-destaque"
                    .to_owned(),
            overlay_class: "pa-lightbox".to_owned(),
            inner_class: "pa-lightbox-inner".to_owned(),
            close_class: "pa-lightbox-close".to_owned(),
            close_label: "Fechar".to_owned(),
        }
    }
}

impl LightboxConfig {
    pub fn image_selector(&self) -> Result<Selector, ConfigError> {
        parse_selector(&self.image_selector, "lightbox.image_selector")
    }
}

/// Behaviors attached to page content after each swap.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BehaviorsConfig {
    /// Call-to-action buttons that navigate to another page.
    pub cta_selector: String,
}

impl Default for BehaviorsConfig {
    fn default() -> Self {
        Self {
            cta_selector: ".projeto .botao, .card .botao, .participar .botao, .botao.destaque"
                .to_owned(),
        }
    }
}

impl BehaviorsConfig {
    pub fn cta_selector(&self) -> Result<Selector, ConfigError> {
        parse_selector(&self.cta_selector, "behaviors.cta_selector")
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// A selector field does not parse.
    #[error("Invalid selector in {field}: {source}")]
    Selector {
        /// Config field path (e.g., "`navigation.main_selector`").
        field: String,
        source: SelectorError,
    },
}

/// Parse a selector-valued field.
fn parse_selector(value: &str, field: &str) -> Result<Selector, ConfigError> {
    Selector::parse(value).map_err(|source| ConfigError::Selector {
        field: field.to_owned(),
        source,
    })
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a CSS class name: non-empty, no whitespace.
fn require_class_name(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.contains(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{field} must be a single class name"
        )));
    }
    Ok(())
}

fn require_delay(value: u32, field: &str) -> Result<(), ConfigError> {
    if value > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "{field} cannot exceed {MAX_DELAY_MS} ms"
        )));
    }
    Ok(())
}

impl Config {
    /// Parse and validate configuration from TOML text.
    ///
    /// Missing sections and keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::from_toml_str`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` or `ConfigError::Selector` on the
    /// first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_navigation()?;
        self.validate_storage()?;
        self.validate_form()?;
        self.validate_lightbox()?;
        self.behaviors.cta_selector()?;
        Ok(())
    }

    fn validate_navigation(&self) -> Result<(), ConfigError> {
        let nav = &self.navigation;
        nav.main_selector()?;
        nav.link_selector()?;

        if nav.page_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "navigation.page_extensions cannot be empty".to_owned(),
            ));
        }
        for ext in &nav.page_extensions {
            if !ext.starts_with('.') || ext.len() < 2 {
                return Err(ConfigError::Validation(format!(
                    "navigation.page_extensions entry `{ext}` must look like `.html`"
                )));
            }
        }

        require_non_empty(&nav.home_page, "navigation.home_page")?;
        if !nav.is_page(&nav.home_page) {
            return Err(ConfigError::Validation(format!(
                "navigation.home_page `{}` must end with a page extension",
                nav.home_page
            )));
        }

        require_delay(nav.exit_delay_ms, "navigation.exit_delay_ms")?;
        require_delay(nav.enter_delay_ms, "navigation.enter_delay_ms")?;

        require_class_name(&nav.loading_class, "navigation.loading_class")?;
        require_class_name(&nav.enabled_class, "navigation.enabled_class")?;
        require_class_name(&nav.exit_class, "navigation.exit_class")?;
        require_class_name(&nav.enter_class, "navigation.enter_class")?;
        require_non_empty(&nav.failure_message, "navigation.failure_message")?;
        Ok(())
    }

    fn validate_storage(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.storage.key, "storage.key")
    }

    fn validate_form(&self) -> Result<(), ConfigError> {
        let form = &self.form;
        if form.selectors.is_empty() {
            return Err(ConfigError::Validation(
                "form.selectors cannot be empty".to_owned(),
            ));
        }
        form.form_selectors()?;

        for (value, field) in form.fields.entries() {
            require_non_empty(value, field)?;
        }
        require_non_empty(&form.volunteer_section, "form.volunteer_section")?;
        require_non_empty(&form.donor_section, "form.donor_section")?;

        if form.min_name_len == 0 {
            return Err(ConfigError::Validation(
                "form.min_name_len must be greater than 0".to_owned(),
            ));
        }
        if form.min_phone_digits == 0 {
            return Err(ConfigError::Validation(
                "form.min_phone_digits must be greater than 0".to_owned(),
            ));
        }
        if form.min_age == 0 {
            return Err(ConfigError::Validation(
                "form.min_age must be greater than 0".to_owned(),
            ));
        }

        require_class_name(&form.invalid_class, "form.invalid_class")?;
        require_class_name(&form.error_class, "form.error_class")?;
        require_delay(form.flash_timeout_ms, "form.flash_timeout_ms")?;
        require_delay(form.fade_out_ms, "form.fade_out_ms")?;
        Ok(())
    }

    fn validate_lightbox(&self) -> Result<(), ConfigError> {
        let lightbox = &self.lightbox;
        lightbox.image_selector()?;
        require_class_name(&lightbox.overlay_class, "lightbox.overlay_class")?;
        require_class_name(&lightbox.inner_class, "lightbox.inner_class")?;
        require_class_name(&lightbox.close_class, "lightbox.close_class")?;
        Ok(())
    }
}
