//! Text helpers shared by the index and the snippet builder
//!
//! Tokens are lowercase alphanumeric runs. Titles, page bodies and queries
//! all go through [`tokenize`].

/// Common English words ignored in queries
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "i",
    "in", "is", "it", "of", "on", "or", "the", "to", "what", "when", "where", "which", "with",
];

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Whether a token is a stop word
pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Distinct query terms in first-seen order, stop words removed
///
/// A query made only of stop words ("how to") keeps its raw tokens so it can
/// still match something.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut all: Vec<String> = Vec::new();
    for token in tokenize(query) {
        if !all.contains(&token) {
            all.push(token);
        }
    }
    let filtered: Vec<String> = all.iter().filter(|t| !is_stop_word(t)).cloned().collect();
    if filtered.is_empty() {
        all
    } else {
        filtered
    }
}

/// Lowercased, token-joined form of a title used for lexical matching
pub fn normalize_title(display_title: &str) -> String {
    tokenize(display_title).join(" ")
}

/// Collapse runs of whitespace into single spaces and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Round a score to three decimals for the wire
pub fn round_score(score: f32) -> f64 {
    ((score as f64) * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Getting Started: AgentCore-Runtime v2!"),
            vec!["getting", "started", "agentcore", "runtime", "v2"]
        );
        assert!(tokenize("  ...  ").is_empty());
    }

    #[test]
    fn test_query_terms_dedup_and_stop_words() {
        assert_eq!(
            query_terms("How to configure the retry policy for retry"),
            vec!["configure", "retry", "policy"]
        );
    }

    #[test]
    fn test_query_terms_all_stop_words() {
        assert_eq!(query_terms("how to"), vec!["how", "to"]);
        assert!(query_terms("").is_empty());
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Getting   Started (Guide) "), "getting started guide");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a\n\n  b\tc  "), "a b c");
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.95), 0.95);
        assert_eq!(round_score(0.12345), 0.123);
        assert_eq!(round_score(1.0), 1.0);
        assert_eq!(round_score(0.0), 0.0);
    }
}
