//! Tool handlers shared by the MCP service, the HTTP API and the CLI
//!
//! Neither handler ever fails: internal errors become `[]` or the
//! `{error: "fetch failed", url}` shape.

use crate::constants::{DEFAULT_SEARCH_K, MAX_BACKFILL_PER_SEARCH, MAX_SEARCH_RESULTS};
use crate::docs::DocCache;
use crate::text::make_query_snippet;
use crate::utils::{query_terms, round_score};

use super::types::{FetchDocResponse, SearchDocResult};

/// Ranked search with on-demand hydration of the preview hits
pub async fn search_docs(cache: &DocCache, query: &str, k: Option<usize>) -> Vec<SearchDocResult> {
    cache.ensure_ready().await;

    let k = k.unwrap_or(DEFAULT_SEARCH_K).min(MAX_SEARCH_RESULTS);
    // nothing can match a query without terms, so never fetch for one
    if k == 0 || query_terms(query).is_empty() {
        return Vec::new();
    }

    let preview = match cache.rank_preview(query, k).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!("search_docs: {}", e);
            return Vec::new();
        }
    };

    let mut uris: Vec<String> = preview.iter().map(|hit| hit.doc.uri.clone()).collect();
    let preview_len = uris.len();
    if preview_len < k {
        let limit = (k - preview_len).min(MAX_BACKFILL_PER_SEARCH);
        let backfill = cache.backfill_candidates(&uris, limit).await;
        uris.extend(backfill);
    }
    let available = cache.hydrate_all(&uris).await;
    tracing::debug!(
        "search_docs '{}': {} preview hits, {} hydration candidates, {} pages available",
        query,
        preview_len,
        uris.len(),
        available
    );

    let hits = match cache.rank_final(query, k).await {
        Ok(hits) => hits,
        Err(e) => {
            tracing::warn!("search_docs: {}", e);
            return Vec::new();
        }
    };

    let url_cache = cache.get_url_cache();
    hits.into_iter()
        .map(|hit| {
            let page = url_cache.get(&hit.doc.uri);
            let snippet = make_query_snippet(page.as_deref(), &hit.doc.display_title, query);
            SearchDocResult {
                url: hit.doc.uri,
                title: hit.doc.display_title,
                score: round_score(hit.score),
                snippet,
            }
        })
        .collect()
}

/// Full page content for a URI, fetched at most once per process
pub async fn fetch_doc(cache: &DocCache, uri: &str) -> FetchDocResponse {
    cache.ensure_ready().await;

    match cache.ensure_page(uri).await {
        Some(page) => FetchDocResponse::from_page(&page),
        None => FetchDocResponse::failed(uri),
    }
}
