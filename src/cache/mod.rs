//! Page store: at-most-once fetch memoization keyed by URI
//!
//! Every URI moves through `Unfetched -> {Fetched(Page) | Failed}` exactly
//! once per process. A failure is remembered and never retried; a success is
//! served from memory forever after. Concurrent callers for the same URI
//! serialize on a per-URI async mutex, so the fetch itself runs only once.

use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::Result;
use crate::fetch::Page;
use crate::url_validator::normalize_uri;

/// Cache entry state for one URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    /// No fetch attempted yet
    Unfetched,
    /// Fetch succeeded
    Fetched(Arc<Page>),
    /// Fetch attempted and failed; terminal for this process
    Failed,
}

impl PageState {
    pub fn page(&self) -> Option<Arc<Page>> {
        match self {
            PageState::Fetched(page) => Some(page.clone()),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PageState::Unfetched)
    }
}

/// URI -> page cache with per-URI fetch exclusion
#[derive(Debug, Default)]
pub struct PageStore {
    /// Terminal states only; a missing key means `Unfetched`
    states: DashMap<String, PageState>,
    locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a URI
    pub fn state(&self, uri: &str) -> PageState {
        self.states
            .get(&normalize_uri(uri))
            .map(|entry| entry.value().clone())
            .unwrap_or(PageState::Unfetched)
    }

    /// The cached page, if the URI was fetched successfully
    pub fn get(&self, uri: &str) -> Option<Arc<Page>> {
        self.state(uri).page()
    }

    /// Return the cached result, or run `fetch` once and memoize its outcome
    ///
    /// `fetch` receives the normalized URI. Its error is logged and stored
    /// as [`PageState::Failed`]; callers only ever see `None`.
    pub async fn get_or_fetch<F, Fut>(&self, uri: &str, fetch: F) -> Option<Arc<Page>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Page>>,
    {
        let key = normalize_uri(uri);

        if let Some(state) = self.terminal_state(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return state.page();
        }

        // Clone the Arc out so no DashMap guard lives across the await
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        // Another task may have finished the fetch while we waited
        if let Some(state) = self.terminal_state(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return state.page();
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let state = match fetch(key.clone()).await {
            Ok(page) => {
                tracing::debug!("Cached page {} ({} chars)", key, page.content.len());
                PageState::Fetched(Arc::new(page))
            }
            Err(e) => {
                if e.is_input_error() {
                    tracing::warn!("Rejected {}: {}", key, e);
                } else {
                    tracing::warn!("Fetch failed for {}: {}", key, e);
                }
                PageState::Failed
            }
        };
        let page = state.page();
        self.states.insert(key.clone(), state);
        drop(guard);
        self.locks.remove(&key);
        page
    }

    fn terminal_state(&self, key: &str) -> Option<PageState> {
        self.states
            .get(key)
            .map(|entry| entry.value().clone())
            .filter(PageState::is_terminal)
    }

    /// Cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut fetched = 0;
        let mut failed = 0;
        for entry in self.states.iter() {
            match entry.value() {
                PageState::Fetched(_) => fetched += 1,
                PageState::Failed => failed += 1,
                PageState::Unfetched => {}
            }
        }
        CacheStats {
            fetched,
            failed,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub fetched: usize,
    pub failed: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f32 / total as f32
    }
}
