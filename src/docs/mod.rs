//! Cache controller: owns the document index and the page store
//!
//! A [`DocCache`] is built once per process and shared by `Arc` with every
//! request handler. The index is built lazily by [`DocCache::ensure_ready`]
//! from the manifest alone; page bodies are pulled in on demand by
//! [`DocCache::ensure_page`], which also writes them back onto the index so
//! the next ranking pass can use body text.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OnceCell, RwLock};

use crate::cache::{PageState, PageStore};
use crate::config::Config;
use crate::constants::{DEFAULT_FETCH_CONCURRENCY, DEFAULT_FETCH_TIMEOUT_SECS};
use crate::error::{DocSearchError, Result};
use crate::fetch::{HttpFetcher, Page, PageFetcher};
use crate::index::{DocIndex, ScoredDoc};
use crate::manifest::Manifest;
use crate::url_validator::UrlValidator;

/// Process-wide documentation cache
pub struct DocCache {
    manifest: Manifest,
    index: OnceCell<RwLock<DocIndex>>,
    pages: PageStore,
    fetcher: Arc<dyn PageFetcher>,
    validator: UrlValidator,
    fetch_timeout: Duration,
    fetch_concurrency: usize,
}

/// Snapshot of index and cache counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocStats {
    pub ready: bool,
    pub docs: usize,
    pub hydrated: usize,
    pub fetched: usize,
    pub failed: usize,
    pub hits: u64,
    pub misses: u64,
    /// Share of page lookups served from the store
    pub hit_rate: f32,
}

impl DocCache {
    pub fn new(manifest: Manifest, fetcher: Arc<dyn PageFetcher>, validator: UrlValidator) -> Self {
        Self {
            manifest,
            index: OnceCell::new(),
            pages: PageStore::new(),
            fetcher,
            validator,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    /// Manifest, allow-list and HTTP fetcher from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let manifest = config.load_manifest()?;
        let validator = config.url_validator(&manifest);
        if validator.is_permissive() {
            tracing::warn!("No allowed domains configured; any http(s) URL may be fetched");
        } else {
            tracing::debug!(
                "Allowed domains: {:?}",
                validator.allowed_domain_prefixes()
            );
        }
        let fetcher = HttpFetcher::new(&config.user_agent, config.fetch_timeout())?;
        Ok(Self::new(manifest, Arc::new(fetcher), validator)
            .with_fetch_timeout(config.fetch_timeout())
            .with_fetch_concurrency(config.fetch_concurrency))
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn validator(&self) -> &UrlValidator {
        &self.validator
    }

    /// Build the index from the manifest on first call; later calls are no-ops
    pub async fn ensure_ready(&self) {
        self.index
            .get_or_init(|| async {
                let index = DocIndex::from_manifest(&self.manifest.docs);
                tracing::info!("Document index ready ({} docs)", index.len());
                RwLock::new(index)
            })
            .await;
    }

    /// The index, or `None` before [`ensure_ready`](Self::ensure_ready)
    pub fn get_index(&self) -> Option<&RwLock<DocIndex>> {
        self.index.get()
    }

    /// Read access to the URI -> page state map
    pub fn get_url_cache(&self) -> &PageStore {
        &self.pages
    }

    /// Cached state of a URI
    pub fn page_state(&self, uri: &str) -> PageState {
        self.pages.state(uri)
    }

    /// Return the page for `uri`, fetching it at most once per process
    ///
    /// Any failure (disallowed URI, network error, timeout, empty body) is
    /// remembered and yields `None` on this and every later call.
    pub async fn ensure_page(&self, uri: &str) -> Option<Arc<Page>> {
        self.ensure_ready().await;
        let index = self.get_index()?;

        self.pages
            .get_or_fetch(uri, |key| async move {
                self.validator.validate_url(&key)?;

                let fetched = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(&key))
                    .await
                    .map_err(|_| {
                        DocSearchError::fetch(
                            &key,
                            format!("timed out after {}s", self.fetch_timeout.as_secs_f32()),
                        )
                    })??;

                let title = match fetched.title.filter(|t| !t.trim().is_empty()) {
                    Some(title) => title,
                    None => index
                        .read()
                        .await
                        .get(&key)
                        .map(|doc| doc.display_title.clone())
                        .unwrap_or_else(|| key.clone()),
                };

                // hydrate before the page becomes visible in the store
                index.write().await.hydrate(&key, &fetched.content);

                Ok(Page {
                    url: key,
                    title,
                    content: fetched.content,
                })
            })
            .await
    }

    /// Run [`ensure_page`](Self::ensure_page) for many URIs, at most
    /// `fetch_concurrency` at a time. Returns how many pages are available.
    pub async fn hydrate_all(&self, uris: &[String]) -> usize {
        stream::iter(uris.iter().cloned())
            .map(|uri| async move { self.ensure_page(&uri).await })
            .buffer_unordered(self.fetch_concurrency)
            .filter(|page| futures::future::ready(page.is_some()))
            .count()
            .await
    }

    /// Docs never fetched yet, in manifest order, skipping `exclude`
    ///
    /// Used to widen hydration when the preview returns fewer than `k` hits,
    /// so a query that only matches body text can still find its document.
    pub async fn backfill_candidates(&self, exclude: &[String], limit: usize) -> Vec<String> {
        let Some(index) = self.get_index() else {
            return Vec::new();
        };
        let index = index.read().await;
        index
            .docs()
            .filter(|doc| !doc.is_hydrated())
            .filter(|doc| !exclude.contains(&doc.uri))
            .filter(|doc| !self.pages.state(&doc.uri).is_terminal())
            .take(limit)
            .map(|doc| doc.uri.clone())
            .collect()
    }

    /// First ranking pass over the index as it stands (titles, plus any
    /// bodies hydrated earlier)
    pub async fn rank_preview(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        self.rank(query, k).await
    }

    /// Second ranking pass, meant to run after the preview hits were hydrated
    ///
    /// Scores and order may differ from the preview; docs that only match on
    /// body text can appear here for the first time.
    pub async fn rank_final(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        self.rank(query, k).await
    }

    async fn rank(&self, query: &str, k: usize) -> Result<Vec<ScoredDoc>> {
        let index = self.get_index().ok_or(DocSearchError::IndexUnavailable)?;
        Ok(index.read().await.search(query, k))
    }

    pub async fn stats(&self) -> DocStats {
        let cache = self.pages.stats();
        let (ready, docs, hydrated) = match self.get_index() {
            Some(index) => {
                let index = index.read().await;
                (true, index.len(), index.hydrated_count())
            }
            None => (false, 0, 0),
        };
        DocStats {
            ready,
            docs,
            hydrated,
            fetched: cache.fetched,
            failed: cache.failed,
            hits: cache.hits,
            misses: cache.misses,
            hit_rate: cache.hit_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetcher;
    use crate::manifest::ManifestEntry;
    use pretty_assertions::assert_eq;

    fn manifest(entries: &[(&str, &str)]) -> Manifest {
        Manifest::new(
            entries
                .iter()
                .map(|(uri, title)| ManifestEntry {
                    uri: uri.to_string(),
                    display_title: title.to_string(),
                })
                .collect(),
        )
    }

    fn cache_with(entries: &[(&str, &str)], fetcher: Arc<StaticFetcher>) -> DocCache {
        let manifest = manifest(entries);
        let validator = UrlValidator::from_origins(manifest.uris());
        DocCache::new(manifest, fetcher, validator)
    }

    #[tokio::test]
    async fn test_index_unavailable_before_ready() {
        let cache = cache_with(&[("https://x/a", "A")], Arc::new(StaticFetcher::new()));
        assert!(cache.get_index().is_none());
        assert!(matches!(
            cache.rank_preview("a", 5).await,
            Err(DocSearchError::IndexUnavailable)
        ));
        assert!(!cache.stats().await.ready);

        cache.ensure_ready().await;
        cache.ensure_ready().await;
        assert_eq!(cache.get_index().unwrap().read().await.len(), 1);
        assert!(cache.rank_preview("a", 5).await.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_page_fetches_once() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://x/a", "A page", "alpha body"));
        let cache = cache_with(&[("https://x/a", "A")], fetcher.clone());

        let first = cache.ensure_page("https://x/a").await.unwrap();
        let second = cache.ensure_page("https://x/a").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.title, "A page");
        assert_eq!(fetcher.calls_for("https://x/a"), 1);
    }

    #[tokio::test]
    async fn test_failure_not_retried() {
        let fetcher = Arc::new(StaticFetcher::new());
        let cache = cache_with(&[("https://x/a", "A")], fetcher.clone());

        assert!(cache.ensure_page("https://x/a").await.is_none());
        assert!(cache.ensure_page("https://x/a").await.is_none());
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(cache.page_state("https://x/a"), PageState::Failed);
    }

    #[tokio::test]
    async fn test_disallowed_domain_never_fetched() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://evil.test/a", "E", "body"));
        let cache = cache_with(&[("https://x/a", "A")], fetcher.clone());

        assert!(cache.ensure_page("https://evil.test/a").await.is_none());
        assert!(cache.ensure_page("not a url").await.is_none());
        assert_eq!(fetcher.calls(), 0);
        assert_eq!(cache.stats().await.failed, 2);
    }

    #[tokio::test]
    async fn test_timeout_is_failure() {
        let fetcher = Arc::new(
            StaticFetcher::new()
                .with_page("https://x/slow", "S", "body")
                .with_delay(Duration::from_millis(500)),
        );
        let cache = cache_with(&[("https://x/slow", "Slow")], fetcher.clone())
            .with_fetch_timeout(Duration::from_millis(20));

        assert!(cache.ensure_page("https://x/slow").await.is_none());
        assert!(cache.ensure_page("https://x/slow").await.is_none());
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_page_title_falls_back_to_display_title() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://x/a", "  ", "body text"));
        let cache = cache_with(&[("https://x/a", "Getting Started")], fetcher);

        let page = cache.ensure_page("https://x/a").await.unwrap();
        assert_eq!(page.title, "Getting Started");
        assert_eq!(page.url, "https://x/a");
    }

    #[tokio::test]
    async fn test_hydration_enables_body_ranking() {
        let fetcher = Arc::new(StaticFetcher::new().with_page(
            "https://x/a",
            "Getting Started",
            "Set the quantum retry policy before deploying.",
        ));
        let cache = cache_with(
            &[("https://x/a", "Getting Started"), ("https://x/b", "Runtime Limits")],
            fetcher,
        );
        cache.ensure_ready().await;

        let preview = cache.rank_preview("quantum retry policy", 5).await.unwrap();
        assert!(preview.is_empty());

        cache.ensure_page("https://x/a").await.unwrap();
        let hits = cache.rank_final("quantum retry policy", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc.uri, "https://x/a");
        assert!(hits[0].doc.is_hydrated());
    }

    #[tokio::test]
    async fn test_backfill_skips_attempted_and_excluded() {
        let fetcher = Arc::new(StaticFetcher::new().with_page("https://x/a", "A", "alpha"));
        let cache = cache_with(
            &[("https://x/a", "A"), ("https://x/b", "B"), ("https://x/c", "C"), ("https://x/d", "D")],
            fetcher,
        );
        assert!(cache.backfill_candidates(&[], 5).await.is_empty());

        cache.ensure_page("https://x/a").await;
        cache.ensure_page("https://x/b").await;
        let exclude = vec!["https://x/c".to_string()];
        assert_eq!(cache.backfill_candidates(&exclude, 5).await, vec!["https://x/d"]);
        assert!(cache.backfill_candidates(&[], 0).await.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_all_bounded_and_counted() {
        let entries: Vec<(String, String)> = (0..10)
            .map(|i| (format!("https://x/{}", i), format!("Doc {}", i)))
            .collect();
        let mut fetcher = StaticFetcher::new().with_delay(Duration::from_millis(5));
        for (uri, title) in &entries {
            fetcher = fetcher.with_page(uri, title, "some body");
        }
        let fetcher = Arc::new(fetcher);
        let refs: Vec<(&str, &str)> = entries
            .iter()
            .map(|(u, t)| (u.as_str(), t.as_str()))
            .collect();
        let cache = cache_with(&refs, fetcher.clone()).with_fetch_concurrency(3);

        let uris: Vec<String> = entries.iter().map(|(u, _)| u.clone()).collect();
        assert_eq!(cache.hydrate_all(&uris).await, 10);
        assert_eq!(cache.hydrate_all(&uris).await, 10);
        assert_eq!(fetcher.calls(), 10);

        let stats = cache.stats().await;
        assert_eq!(stats.docs, 10);
        assert_eq!(stats.hydrated, 10);
        assert_eq!(stats.fetched, 10);
        assert_eq!((stats.hits, stats.misses), (10, 10));
        assert!((stats.hit_rate - 0.5).abs() < f32::EPSILON);
    }
}
