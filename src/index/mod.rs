//! In-memory document catalog with lexical ranking
//!
//! The index is built once from the manifest using titles only, so startup
//! never touches the network. Page bodies arrive later through [`DocIndex::hydrate`],
//! which updates the per-document term statistics in place; the next
//! [`DocIndex::search`] can then rank on body text as well.
//!
//! Scoring (all components in [0, 1]):
//!
//! ```text
//! score = 0.6 * title_coverage + 0.1 * title_phrase + 0.3 * body
//! ```
//!
//! - `title_coverage`: share of distinct query terms present in the title
//! - `title_phrase`: 1 when the whole normalized query occurs in the title
//! - `body`: mean over query terms of `tf / (tf + 1.2)` in the hydrated body

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::constants::{BODY_TF_SATURATION, BODY_WEIGHT, TITLE_COVERAGE_WEIGHT, TITLE_PHRASE_WEIGHT};
use crate::manifest::ManifestEntry;
use crate::url_validator::normalize_uri;
use crate::utils::{normalize_title, query_terms, tokenize};

/// One known documentation page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Doc {
    /// Canonical identifier (URL)
    pub uri: String,
    /// Human-readable title shown in results
    pub display_title: String,
    /// Lowercased, token-joined title used for matching
    pub index_title: String,
    /// Body text; empty until hydrated
    #[serde(skip)]
    pub content: Arc<str>,
}

impl Doc {
    /// Create a doc from a manifest entry, deriving `index_title`
    pub fn new(uri: impl Into<String>, display_title: impl Into<String>) -> Self {
        let display_title = display_title.into();
        Self {
            uri: uri.into(),
            index_title: normalize_title(&display_title),
            display_title,
            content: Arc::from(""),
        }
    }

    pub fn is_hydrated(&self) -> bool {
        !self.content.is_empty()
    }
}

/// A ranked search hit
#[derive(Debug, Clone)]
pub struct ScoredDoc {
    pub score: f32,
    pub doc: Doc,
}

/// Ranking state for one doc
#[derive(Debug)]
struct IndexedDoc {
    doc: Doc,
    title_terms: HashSet<String>,
    body_tf: HashMap<String, u32>,
}

impl IndexedDoc {
    fn new(doc: Doc) -> Self {
        let title_terms = tokenize(&doc.index_title).into_iter().collect();
        Self {
            doc,
            title_terms,
            body_tf: HashMap::new(),
        }
    }

    fn score(&self, terms: &[String], phrase: &str) -> f32 {
        if terms.is_empty() {
            return 0.0;
        }
        let n = terms.len() as f32;

        let title_hits = terms.iter().filter(|t| self.title_terms.contains(*t)).count();
        let title_coverage = title_hits as f32 / n;

        let title_phrase = if !phrase.is_empty() && contains_phrase(&self.doc.index_title, phrase) {
            1.0
        } else {
            0.0
        };

        let body = if self.body_tf.is_empty() {
            0.0
        } else {
            terms
                .iter()
                .map(|t| {
                    let tf = self.body_tf.get(t).copied().unwrap_or(0) as f32;
                    tf / (tf + BODY_TF_SATURATION)
                })
                .sum::<f32>()
                / n
        };

        let score = TITLE_COVERAGE_WEIGHT * title_coverage
            + TITLE_PHRASE_WEIGHT * title_phrase
            + BODY_WEIGHT * body;
        score.clamp(0.0, 1.0)
    }
}

/// Whole-token phrase containment on space-joined token strings
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if haystack == phrase {
        return true;
    }
    let padded = format!(" {} ", haystack);
    padded.contains(&format!(" {} ", phrase))
}

/// Document catalog plus ranking state
#[derive(Debug, Default)]
pub struct DocIndex {
    docs: Vec<IndexedDoc>,
    /// normalized uri -> position in `docs`
    positions: HashMap<String, usize>,
}

impl DocIndex {
    /// Build from manifest entries; later duplicates of a URI are ignored
    pub fn from_manifest(entries: &[ManifestEntry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            index.insert(Doc::new(entry.uri.clone(), entry.display_title.clone()));
        }
        tracing::debug!("Index built with {} docs (titles only)", index.len());
        index
    }

    /// Add a doc; returns false if its URI is already present
    pub fn insert(&mut self, doc: Doc) -> bool {
        let key = normalize_uri(&doc.uri);
        if self.positions.contains_key(&key) {
            tracing::warn!("Duplicate document URI ignored: {}", doc.uri);
            return false;
        }
        self.positions.insert(key, self.docs.len());
        self.docs.push(IndexedDoc::new(doc));
        true
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Number of docs whose content has been hydrated
    pub fn hydrated_count(&self) -> usize {
        self.docs.iter().filter(|d| d.doc.is_hydrated()).count()
    }

    /// Look up a doc by URI (fragment and surrounding whitespace ignored)
    pub fn get(&self, uri: &str) -> Option<&Doc> {
        self.positions
            .get(&normalize_uri(uri))
            .map(|&pos| &self.docs[pos].doc)
    }

    /// All docs in manifest order
    pub fn docs(&self) -> impl Iterator<Item = &Doc> {
        self.docs.iter().map(|d| &d.doc)
    }

    /// Write fetched body text onto the matching doc
    ///
    /// Idempotent: the first hydration wins and later calls are no-ops.
    /// Returns true only when content was written.
    pub fn hydrate(&mut self, uri: &str, content: &str) -> bool {
        let Some(&pos) = self.positions.get(&normalize_uri(uri)) else {
            return false;
        };
        let entry = &mut self.docs[pos];
        if entry.doc.is_hydrated() || content.trim().is_empty() {
            return false;
        }

        let mut body_tf: HashMap<String, u32> = HashMap::new();
        for token in tokenize(content) {
            *body_tf.entry(token).or_insert(0) += 1;
        }
        entry.body_tf = body_tf;
        entry.doc.content = Arc::from(content);
        tracing::debug!(
            "Hydrated '{}' ({} distinct terms)",
            entry.doc.uri,
            entry.body_tf.len()
        );
        true
    }

    /// Rank docs against a query
    ///
    /// Returns at most `k` hits with score > 0, sorted by score descending;
    /// equal scores keep manifest order.
    pub fn search(&self, query: &str, k: usize) -> Vec<ScoredDoc> {
        if k == 0 {
            return Vec::new();
        }
        let terms = query_terms(query);
        if terms.is_empty() {
            return Vec::new();
        }
        let phrase = terms.join(" ");

        // par_iter().collect() preserves input order, which the stable sort relies on
        let mut scored: Vec<(usize, f32)> = self
            .docs
            .par_iter()
            .enumerate()
            .map(|(pos, d)| (pos, d.score(&terms, &phrase)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(pos, score)| ScoredDoc {
                score,
                doc: self.docs[pos].doc.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(uri: &str, title: &str) -> ManifestEntry {
        ManifestEntry {
            uri: uri.to_string(),
            display_title: title.to_string(),
        }
    }

    fn sample_index() -> DocIndex {
        DocIndex::from_manifest(&[
            entry("https://x/a", "Getting Started"),
            entry("https://x/b", "Runtime Configuration"),
            entry("https://x/c", "Configuring the Gateway"),
            entry("https://x/d", "Runtime Quotas and Limits"),
        ])
    }

    fn uris(hits: &[ScoredDoc]) -> Vec<&str> {
        hits.iter().map(|h| h.doc.uri.as_str()).collect()
    }

    #[test]
    fn test_index_title_is_derived() {
        let doc = Doc::new("https://x/a", "Getting Started: Quick-Tour");
        assert_eq!(doc.index_title, "getting started quick tour");
        assert!(!doc.is_hydrated());
    }

    #[test]
    fn test_title_match_ranks_first() {
        let index = sample_index();
        let hits = index.search("runtime configuration", 5);
        assert_eq!(uris(&hits), vec!["https://x/b", "https://x/d"]);
        assert!(hits[0].score > hits[1].score);
    }

    #[test]
    fn test_exact_title_scores_full_title_weight() {
        let index = sample_index();
        let hits = index.search("Getting Started", 5);
        assert_eq!(hits.len(), 1);
        let expected = TITLE_COVERAGE_WEIGHT + TITLE_PHRASE_WEIGHT;
        assert!((hits[0].score - expected).abs() < 1e-6);
    }

    #[test]
    fn test_zero_score_docs_excluded() {
        let index = sample_index();
        assert!(index.search("kubernetes", 5).is_empty());
    }

    #[test]
    fn test_k_limits_results() {
        let index = sample_index();
        assert_eq!(index.search("runtime", 1).len(), 1);
        assert!(index.search("runtime", 0).is_empty());
    }

    #[test]
    fn test_ties_keep_manifest_order() {
        let index = DocIndex::from_manifest(&[
            entry("https://x/1", "Memory Overview"),
            entry("https://x/2", "Memory Strategies"),
            entry("https://x/3", "Memory API"),
        ]);
        let hits = index.search("memory", 10);
        assert_eq!(uris(&hits), vec!["https://x/1", "https://x/2", "https://x/3"]);
    }

    #[test]
    fn test_hydration_enables_body_match() {
        let mut index = sample_index();
        assert!(index.search("quantum retry policy", 5).is_empty());

        assert!(index.hydrate("https://x/a", "Configure the quantum retry policy here."));
        let hits = index.search("quantum retry policy", 5);
        assert_eq!(uris(&hits), vec!["https://x/a"]);
        assert!(hits[0].score > 0.0 && hits[0].score <= BODY_WEIGHT);
    }

    #[test]
    fn test_hydrate_is_idempotent() {
        let mut index = sample_index();
        assert!(index.hydrate("https://x/b", "first body"));
        assert!(!index.hydrate("https://x/b", "second body"));
        assert_eq!(&*index.get("https://x/b").unwrap().content, "first body");
        assert_eq!(index.hydrated_count(), 1);
    }

    #[test]
    fn test_hydrate_unknown_or_empty() {
        let mut index = sample_index();
        assert!(!index.hydrate("https://x/unknown", "body"));
        assert!(!index.hydrate("https://x/a", "   "));
        assert_eq!(index.hydrated_count(), 0);
    }

    #[test]
    fn test_lookup_ignores_fragment() {
        let mut index = sample_index();
        assert!(index.get("https://x/c#section-2").is_some());
        assert!(index.hydrate("https://x/c#top", "gateway targets"));
        assert!(index.get("https://x/c").unwrap().is_hydrated());
    }

    #[test]
    fn test_duplicate_uris_first_wins() {
        let index = DocIndex::from_manifest(&[
            entry("https://x/a", "First"),
            entry("https://x/a", "Second"),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("https://x/a").unwrap().display_title, "First");
    }

    #[test]
    fn test_scores_bounded_and_sorted() {
        let mut index = sample_index();
        index.hydrate(
            "https://x/d",
            "runtime runtime runtime quotas limits runtime configuration",
        );
        let hits = index.search("runtime quotas limits configuration", 10);
        assert!(!hits.is_empty());
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    }

    #[test]
    fn test_stop_word_query() {
        let index = sample_index();
        // a stop-word-only query falls back to its raw tokens
        assert_eq!(uris(&index.search("the", 5)), vec!["https://x/c"]);
        assert_eq!(uris(&index.search("configuring the gateway", 5)), vec!["https://x/c"]);
    }
}
