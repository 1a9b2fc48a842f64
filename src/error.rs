//! Centralized error types for docsearch
//!
//! The core never lets these escape to MCP callers: the cache turns fetch
//! errors into a memoized `Failed` state and the tool layer turns a missing
//! index into an empty result. They exist so the failure reason reaches the
//! logs, and so the CLI edges can report configuration problems.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for docsearch operations
#[derive(Error, Debug)]
pub enum DocSearchError {
    /// The index was queried before `ensure_ready` built it
    #[error("Index unavailable: the document catalog has not been loaded")]
    IndexUnavailable,

    /// Network, status or extraction failure for a specific page
    #[error("Fetch failed: {url} - {message}")]
    FetchFailed { url: String, message: String },

    /// Malformed URI or a URI outside the allowed domains
    #[error("Invalid URL: {url} - {message}")]
    InvalidUrl { url: String, message: String },

    /// One or more URLs rejected by the domain allow-list
    #[error("URL validation failed for: {}", urls.join(", "))]
    UrlValidation { urls: Vec<String> },

    /// Manifest loading or validation errors
    #[error("Manifest error: {message}")]
    Manifest { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// I/O operation errors
    #[error("I/O error: {path} - {message}")]
    Io { path: PathBuf, message: String },
}

impl DocSearchError {
    /// Create a fetch error
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FetchFailed {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-URL error
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a manifest error
    pub fn manifest(message: impl Into<String>) -> Self {
        Self::Manifest {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by caller input rather than the network
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidUrl { .. } | Self::UrlValidation { .. })
    }
}

/// Result type alias for docsearch operations
pub type Result<T> = std::result::Result<T, DocSearchError>;

impl From<std::io::Error> for DocSearchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            message: err.to_string(),
        }
    }
}
