//! Configuration embedded in the page.

use air_config::Config;

/// Parse the inline configuration block, if the page has one.
///
/// A missing block yields the defaults. An invalid block is logged and
/// also yields the defaults, so a typo never disables the controller.
#[must_use]
pub fn load_config(inline: Option<&str>) -> Config {
    let Some(text) = inline.filter(|text| !text.trim().is_empty()) else {
        return Config::default();
    };
    match Config::from_toml_str(text) {
        Ok(config) => {
            tracing::debug!("Loaded inline configuration");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid inline configuration, using defaults");
            Config::default()
        }
    }
}
