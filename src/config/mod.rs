//! Layered configuration
//!
//! Precedence (lowest first): built-in defaults, YAML config file
//! (`--config` or `DOCSEARCH_CONFIG`), `DOCSEARCH_*` environment variables,
//! then CLI flags applied by the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    default_user_agent, DEFAULT_FETCH_CONCURRENCY, DEFAULT_FETCH_TIMEOUT_SECS, ENV_ALLOWED_DOMAINS,
    ENV_CONFIG, ENV_FETCH_CONCURRENCY, ENV_FETCH_TIMEOUT_SECS, ENV_MANIFEST, ENV_USER_AGENT,
};
use crate::error::{DocSearchError, Result};
use crate::manifest::Manifest;
use crate::url_validator::UrlValidator;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Manifest file; the built-in manifest is used when unset
    pub manifest_path: Option<PathBuf>,
    /// Allowed domain prefixes; derived from the manifest when empty
    pub allowed_domains: Vec<String>,
    /// Per-fetch timeout
    pub fetch_timeout_secs: u64,
    /// Concurrent fetches while hydrating search results
    pub fetch_concurrency: usize,
    /// User-Agent sent with page fetches
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            manifest_path: None,
            allowed_domains: Vec::new(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY.min(num_cpus::get() * 2).max(1),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Defaults, then the config file (explicit path or `DOCSEARCH_CONFIG`), then env
    ///
    /// Not validated: callers layer their own overrides on top and call
    /// [`Config::validate`] once everything is applied.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(ENV_CONFIG).ok().map(PathBuf::from);
        let mut config = match config_path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a YAML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocSearchError::io(path, e.to_string()))?;
        let config: Config = serde_yaml_ng::from_str(&text).map_err(|e| {
            DocSearchError::config(format!("invalid config file {}: {}", path.display(), e))
        })?;
        tracing::debug!("Loaded config file {}", path.display());
        Ok(config)
    }

    /// Apply `DOCSEARCH_*` overrides from a variable lookup
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(ENV_MANIFEST).filter(|v| !v.trim().is_empty()) {
            self.manifest_path = Some(PathBuf::from(path));
        }
        if let Some(domains) = lookup(ENV_ALLOWED_DOMAINS) {
            self.allowed_domains = domains
                .split(',')
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect();
        }
        if let Some(value) = lookup(ENV_FETCH_TIMEOUT_SECS) {
            self.fetch_timeout_secs = parse_env(ENV_FETCH_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_CONCURRENCY) {
            self.fetch_concurrency = parse_env(ENV_FETCH_CONCURRENCY, &value)?;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT).filter(|v| !v.trim().is_empty()) {
            self.user_agent = agent;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(DocSearchError::config("fetch_timeout_secs must be > 0"));
        }
        if self.fetch_concurrency == 0 {
            return Err(DocSearchError::config("fetch_concurrency must be > 0"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Load the configured manifest, or the built-in one
    pub fn load_manifest(&self) -> Result<Manifest> {
        match &self.manifest_path {
            Some(path) => Manifest::load(path),
            None => {
                tracing::info!("No manifest configured, using built-in manifest");
                Ok(Manifest::builtin())
            }
        }
    }

    /// Allow-list from config, or the manifest's origins when none is set
    pub fn url_validator(&self, manifest: &Manifest) -> UrlValidator {
        if self.allowed_domains.is_empty() {
            UrlValidator::from_origins(manifest.uris())
        } else {
            UrlValidator::new(&self.allowed_domains)
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| DocSearchError::config(format!("{} has invalid value '{}'", key, value)))
}
