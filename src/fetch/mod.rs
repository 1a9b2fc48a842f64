//! Page fetching: the network collaborator behind the page cache
//!
//! [`PageFetcher`] is the seam the cache talks to. [`HttpFetcher`] is the
//! production implementation (reqwest + scraper); tests swap in a fake that
//! counts calls.

mod extract;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::time::Duration;

use crate::constants::MAX_PAGE_BYTES;
use crate::error::{DocSearchError, Result};

pub use extract::{extract_html, extract_text};

/// Fetched representation of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Canonical URL (normalized request URI)
    pub url: String,
    /// Title as observed at fetch time
    pub title: String,
    /// Full extracted text
    pub content: String,
}

/// What a fetcher returns before the cache turns it into a [`Page`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub title: Option<String>,
    pub content: String,
}

/// Network fetch collaborator: `fetch(uri) -> {title, content} | failure`
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// HTTP(S) fetcher with a bounded per-request timeout
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| DocSearchError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocSearchError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocSearchError::fetch(url, format!("HTTP {}", status)));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"));

        let body = read_capped(response.bytes_stream(), MAX_PAGE_BYTES)
            .await
            .map_err(|e| DocSearchError::fetch(url, e.to_string()))?;
        let text = String::from_utf8_lossy(&body);

        let looks_like_html = is_html.unwrap_or_else(|| text.trim_start().starts_with('<'));
        let page = if looks_like_html {
            extract_html(&text)
        } else {
            extract_text(&text)
        };

        if page.content.is_empty() {
            return Err(DocSearchError::fetch(url, "no text content extracted"));
        }
        Ok(page)
    }
}

/// Collect a body stream, stopping once `cap` bytes are held
async fn read_capped<S, B, E>(stream: S, cap: usize) -> std::result::Result<Vec<u8>, E>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
{
    futures::pin_mut!(stream);
    let mut body = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let chunk = chunk.as_ref();
        let room = cap - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            tracing::debug!("Page body truncated at {} bytes", cap);
            break;
        }
        body.extend_from_slice(chunk);
    }
    Ok(body)
}
