//! MCP types and request/response structures

use rmcp::schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::fetch::Page;

/// Request for search_docs
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchDocsRequest {
    /// Search query string (e.g. "getting started", "api reference")
    pub query: String,

    /// Maximum number of results to return (default: 5, max: 50)
    pub k: Option<usize>,
}

/// Request for fetch_doc
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FetchDocRequest {
    /// Document URI (http/https URL, usually taken from search_docs results)
    pub uri: String,
}

/// One search_docs hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchDocResult {
    /// Document URL
    pub url: String,
    /// Display title
    pub title: String,
    /// Relevance in [0, 1], rounded to 3 decimals
    pub score: f64,
    /// Contextual content preview
    pub snippet: String,
}

/// fetch_doc outcome, serialized without a tag:
/// `{url, title, content}` or `{error, url}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FetchDocResponse {
    Success {
        url: String,
        title: String,
        content: String,
    },
    Error {
        error: String,
        url: String,
    },
}

impl FetchDocResponse {
    pub fn from_page(page: &Page) -> Self {
        Self::Success {
            url: page.url.clone(),
            title: page.title.clone(),
            content: page.content.clone(),
        }
    }

    pub fn failed(url: impl Into<String>) -> Self {
        Self::Error {
            error: crate::constants::FETCH_FAILED.to_string(),
            url: url.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
