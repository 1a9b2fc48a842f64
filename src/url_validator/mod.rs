//! Domain allow-list for fetchable URLs
//!
//! Only pages under an allowed prefix (e.g. `https://docs.example.com`) are
//! ever fetched. The allow-list comes from configuration, or is derived from
//! the origins of the manifest URIs.

use std::collections::BTreeSet;
use url::Url;

use crate::error::{DocSearchError, Result};

/// Validates URLs against a set of allowed domain prefixes
#[derive(Debug, Clone, Default)]
pub struct UrlValidator {
    allowed_domain_prefixes: BTreeSet<String>,
}

impl UrlValidator {
    /// Create a validator from domain prefixes such as `https://docs.example.com`
    ///
    /// Prefixes are compared case-insensitively; trailing slashes are ignored.
    pub fn new<I, S>(allowed_domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_domain_prefixes = allowed_domains
            .into_iter()
            .map(|d| d.as_ref().trim().trim_end_matches('/').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        Self {
            allowed_domain_prefixes,
        }
    }

    /// Build an allow-list from the `scheme://host[:port]` origins of the given URIs
    pub fn from_origins<'a>(uris: impl IntoIterator<Item = &'a str>) -> Self {
        let origins: Vec<String> = uris
            .into_iter()
            .filter_map(|u| Url::parse(u.trim()).ok())
            .filter(|u| matches!(u.scheme(), "http" | "https"))
            .map(|u| u.origin().ascii_serialization())
            .filter(|o| o != "null")
            .collect();
        Self::new(origins)
    }

    /// The normalized prefixes, sorted
    pub fn allowed_domain_prefixes(&self) -> &BTreeSet<String> {
        &self.allowed_domain_prefixes
    }

    /// An empty allow-list accepts any http(s) URL
    pub fn is_permissive(&self) -> bool {
        self.allowed_domain_prefixes.is_empty()
    }

    /// Check whether a URL falls under one of the allowed prefixes
    ///
    /// The prefix must end on a path boundary, so `https://example.com` does
    /// not admit `https://example.com.evil.net/`.
    pub fn is_url_allowed(&self, url: &str) -> bool {
        let candidate = url.trim().to_lowercase();
        if !(candidate.starts_with("http://") || candidate.starts_with("https://")) {
            return false;
        }
        if self.is_permissive() {
            return true;
        }
        self.allowed_domain_prefixes.iter().any(|prefix| {
            candidate
                .strip_prefix(prefix.as_str())
                .map(|rest| {
                    rest.is_empty()
                        || rest.starts_with('/')
                        || rest.starts_with('?')
                        || rest.starts_with('#')
                })
                .unwrap_or(false)
        })
    }

    /// Parse a single URL and check it against the allow-list
    pub fn validate_url(&self, url: &str) -> Result<Url> {
        let parsed = Url::parse(url.trim())
            .map_err(|e| DocSearchError::invalid_url(url, e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DocSearchError::invalid_url(
                url,
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        if !self.is_url_allowed(url) {
            return Err(DocSearchError::invalid_url(url, "domain not allowed"));
        }
        Ok(parsed)
    }

    /// Validate a batch of URLs; on failure the error names every rejected URL
    pub fn validate_urls(&self, urls: &[String]) -> Result<Vec<String>> {
        let invalid: Vec<String> = urls
            .iter()
            .filter(|u| !self.is_url_allowed(u))
            .cloned()
            .collect();
        if !invalid.is_empty() {
            return Err(DocSearchError::UrlValidation { urls: invalid });
        }
        Ok(urls.to_vec())
    }
}

/// Canonical cache key for a URI: trimmed, fragment removed
pub fn normalize_uri(uri: &str) -> String {
    let trimmed = uri.trim();
    match trimmed.split_once('#') {
        Some((base, _)) => base.to_string(),
        None => trimmed.to_string(),
    }
}
