//! Which clicks become client-side navigations.

use air_config::NavigationConfig;
use url::Url;

use crate::host::Location;

/// Keyboard modifiers held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    #[must_use]
    pub fn any(self) -> bool {
        self.meta || self.ctrl || self.shift || self.alt
    }
}

/// A click on the document.
#[derive(Debug, Clone)]
pub struct Click<N> {
    /// Element the click landed on.
    pub target: N,
    /// Mouse button (0 is primary).
    pub button: i16,
    pub default_prevented: bool,
    pub modifiers: Modifiers,
}

impl<N> Click<N> {
    /// Plain primary-button click on `target`.
    pub fn primary(target: N) -> Self {
        Self {
            target,
            button: 0,
            default_prevented: false,
            modifiers: Modifiers::default(),
        }
    }
}

/// What the host should do with a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickDecision {
    /// Let the browser handle it.
    Ignore,
    /// Prevent the default action and load this URL.
    Navigate(String),
}

/// Link interception rules.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    navigation: NavigationConfig,
}

impl LinkPolicy {
    #[must_use]
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            navigation: config.clone(),
        }
    }

    /// Whether a click qualifies at all, before looking at the link.
    #[must_use]
    pub fn accepts_click<N>(&self, click: &Click<N>) -> bool {
        !click.default_prevented && click.button == 0 && !click.modifiers.any()
    }

    /// Decide whether a link's `href` attribute is loaded client-side.
    ///
    /// Hash-only links, links that resolve to another host, and non-HTTP
    /// schemes (`mailto:`, `tel:`, `javascript:`) are left alone. Internal
    /// pages, the site root and paths under the current page are
    /// intercepted. Everything else falls through to the browser.
    #[must_use]
    pub fn should_intercept(&self, href: &str, location: &Location) -> bool {
        if href.is_empty() || href.starts_with('#') {
            return false;
        }
        let Ok(base) = Url::parse(&location.href) else {
            tracing::warn!(href = %location.href, "Document location is not a URL");
            return false;
        };
        let Ok(target) = base.join(href) else {
            return false;
        };
        if !matches!(target.scheme(), "http" | "https") {
            return false;
        }
        if link_host(&target) != link_host(&base) {
            return false;
        }
        self.is_page(href)
            || href == "/"
            || (!location.pathname.is_empty() && href.starts_with(&location.pathname))
    }

    /// Whether `href` ends with a page extension.
    #[must_use]
    pub fn is_page(&self, href: &str) -> bool {
        self.navigation.is_page(href)
    }
}

/// Resolve `href` against the document location, as an anchor's `href`
/// property does.
#[must_use]
pub fn resolve_link(href: &str, location: &Location) -> Option<Url> {
    Url::parse(&location.href).ok()?.join(href).ok()
}

/// Host and non-default port of `url` (`example.org:8080`), matching the
/// anchor's `host` property. Empty for URLs without a host.
#[must_use]
pub fn link_host(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_owned(),
        (None, _) => String::new(),
    }
}

/// Page to load for a history entry at `pathname`.
///
/// The last path segment, or `home_page` when it is empty.
#[must_use]
pub fn page_for_path(pathname: &str, home_page: &str) -> String {
    pathname
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(home_page)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn policy() -> LinkPolicy {
        LinkPolicy::new(&NavigationConfig::default())
    }

    fn location() -> Location {
        Location {
            href: "https://projetoair.org/index.html".to_owned(),
            pathname: "/index.html".to_owned(),
        }
    }

    fn host_of(href: &str) -> String {
        link_host(&resolve_link(href, &location()).unwrap())
    }

    #[test]
    fn test_intercepts_internal_pages() {
        let policy = policy();
        for href in [
            "projetos.html",
            "/cadastro.html",
            "https://projetoair.org/sobre.html",
            "/",
            "/index.html?x=1",
        ] {
            assert!(policy.should_intercept(href, &location()), "{href}");
        }
    }

    #[test]
    fn test_ignores_other_links() {
        let policy = policy();
        for href in [
            "",
            "#contato",
            "mailto:contato@projetoair.org",
            "tel:+5511999999999",
            "https://instagram.com/projetoair",
            "//cdn.example.com/page.html",
            "assets/relatorio.pdf",
        ] {
            assert!(!policy.should_intercept(href, &location()), "{href}");
        }
    }

    #[test]
    fn test_accepts_only_plain_primary_clicks() {
        let policy = policy();
        assert!(policy.accepts_click(&Click::primary(())));

        let mut click = Click::primary(());
        click.button = 1;
        assert!(!policy.accepts_click(&click));

        for modifiers in [
            Modifiers { meta: true, ..Modifiers::default() },
            Modifiers { ctrl: true, ..Modifiers::default() },
            Modifiers { shift: true, ..Modifiers::default() },
            Modifiers { alt: true, ..Modifiers::default() },
        ] {
            let click = Click {
                modifiers,
                ..Click::primary(())
            };
            assert!(!policy.accepts_click(&click), "{modifiers:?}");
        }

        let click = Click {
            default_prevented: true,
            ..Click::primary(())
        };
        assert!(!policy.accepts_click(&click));
    }

    #[test]
    fn test_link_host() {
        assert_eq!(host_of("a.html"), "projetoair.org");
        assert_eq!(host_of("HTTPS://User@Site.org:443/x"), "site.org");
        assert_eq!(host_of("http://site.org:8080/"), "site.org:8080");
        assert_eq!(host_of("//cdn.org/a"), "cdn.org");
        assert_eq!(host_of("javascript:void(0)"), "");
    }

    #[test]
    fn test_backslash_and_padded_hrefs_resolve_like_the_browser() {
        let policy = policy();
        for href in [
            r"\\evil.example\page.html",
            r"/\evil.example/page.html",
            " //evil.example/page.html",
        ] {
            assert_eq!(host_of(href), "evil.example", "{href}");
            assert!(!policy.should_intercept(href, &location()), "{href}");
        }
    }

    #[test]
    fn test_ignores_other_schemes_on_same_host() {
        let policy = policy();
        for href in ["javascript:go('projetos.html')", "data:text/html,x.html"] {
            assert!(!policy.should_intercept(href, &location()), "{href}");
        }
        assert!(policy.should_intercept("http://projetoair.org/sobre.html", &location()));
    }

    #[test]
    fn test_page_extensions_follow_config() {
        let config = NavigationConfig {
            page_extensions: vec![".htm".to_owned()],
            ..NavigationConfig::default()
        };
        let policy = LinkPolicy::new(&config);
        assert!(policy.is_page("sobre.htm"));
        assert!(!policy.is_page("sobre.html"));
    }

    #[test]
    fn test_page_for_path() {
        assert_eq!(page_for_path("/site/projetos.html", "index.html"), "projetos.html");
        assert_eq!(page_for_path("/", "index.html"), "index.html");
        assert_eq!(page_for_path("", "index.html"), "index.html");
        assert_eq!(page_for_path("/site/", "inicio.html"), "inicio.html");
    }
}
