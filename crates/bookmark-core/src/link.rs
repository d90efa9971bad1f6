use std::fmt;

use tracing::debug;
use url::Url;

use crate::error::{StoreError, StoreResult};

pub const DEFAULT_FAVICON_SERVICE: &str =
    "https://s2.googleusercontent.com/s2/favicons?domain={host}&sz={size}";
pub const DEFAULT_FAVICON_SIZE: u32 = 32;

/// Trims `raw`, prefixes `https://` unless it already carries an `http://` or
/// `https://` scheme, and checks that the result parses as an absolute URL
/// with a host.
pub fn normalize_url(raw: &str) -> StoreResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidUrl(raw.to_string()));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    match Url::parse(&candidate) {
        Ok(parsed) if parsed.host_str().is_some_and(|host| !host.is_empty()) => Ok(candidate),
        Ok(_) => Err(StoreError::InvalidUrl(raw.to_string())),
        Err(err) => {
            debug!(url = %candidate, error = %err, "rejecting bookmark url");
            Err(StoreError::InvalidUrl(raw.to_string()))
        }
    }
}

/// Maps a bookmark URL to the URL of its icon. Failure is not an error: an
/// empty string tells the caller to fall back to a generic icon.
pub trait FaviconResolver: fmt::Debug {
    fn favicon_url(&self, url: &str) -> String;
}

/// Fills `{host}` and `{size}` in a service URL template.
#[derive(Debug, Clone)]
pub struct TemplateFavicons {
    template: String,
    size: u32,
}

impl TemplateFavicons {
    pub fn new(template: impl Into<String>, size: u32) -> Self {
        Self {
            template: template.into(),
            size,
        }
    }
}

impl Default for TemplateFavicons {
    fn default() -> Self {
        Self::new(DEFAULT_FAVICON_SERVICE, DEFAULT_FAVICON_SIZE)
    }
}

impl FaviconResolver for TemplateFavicons {
    fn favicon_url(&self, url: &str) -> String {
        let Some(host) = url_host(url) else {
            return String::new();
        };
        self.template
            .replace("{host}", &host)
            .replace("{size}", &self.size.to_string())
    }
}

fn url_host(url: &str) -> Option<String> {
    let candidate = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    let parsed = Url::parse(&candidate).ok()?;
    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::{FaviconResolver, TemplateFavicons, normalize_url};
    use crate::error::StoreError;

    #[test]
    fn normalize_adds_missing_scheme() {
        assert_eq!(
            normalize_url("example.com").expect("valid"),
            "https://example.com"
        );
        assert_eq!(
            normalize_url("  http://example.com/a ").expect("valid"),
            "http://example.com/a"
        );
    }

    #[test]
    fn normalize_rejects_blank_and_unparseable() {
        assert_eq!(
            normalize_url("   "),
            Err(StoreError::InvalidUrl("   ".to_string()))
        );
        assert!(matches!(
            normalize_url("exa mple.com"),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn favicon_uses_hostname() {
        let favicons = TemplateFavicons::default();
        assert_eq!(
            favicons.favicon_url("https://github.com/rust-lang"),
            "https://s2.googleusercontent.com/s2/favicons?domain=github.com&sz=32"
        );
        assert_eq!(
            favicons.favicon_url("docs.rs"),
            "https://s2.googleusercontent.com/s2/favicons?domain=docs.rs&sz=32"
        );
    }

    #[test]
    fn favicon_of_malformed_url_is_empty() {
        let favicons = TemplateFavicons::new("{host}/{size}", 16);
        assert_eq!(favicons.favicon_url("http://"), "");
        assert_eq!(favicons.favicon_url("https://a.test"), "a.test/16");
    }
}
