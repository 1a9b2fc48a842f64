//! Snippet construction for search results
//!
//! A snippet is always displayable: page text when a page is cached, the
//! title otherwise, and a fixed placeholder as a last resort.

use crate::constants::{NO_PREVIEW, SNIPPET_LEAD_CHARS, SNIPPET_MAX_CHARS};
use crate::fetch::Page;
use crate::utils::{collapse_whitespace, query_terms};

const ELLIPSIS: &str = "...";

/// Leading text of the page, or the fallback title when there is no page
pub fn make_snippet(page: Option<&Page>, fallback_title: &str) -> String {
    make_snippet_with_limit(page, fallback_title, None, SNIPPET_MAX_CHARS)
}

/// Like [`make_snippet`], but centred on the first occurrence of a query term
pub fn make_query_snippet(page: Option<&Page>, fallback_title: &str, query: &str) -> String {
    make_snippet_with_limit(page, fallback_title, Some(query), SNIPPET_MAX_CHARS)
}

/// Snippet builder with an explicit maximum length in characters
pub fn make_snippet_with_limit(
    page: Option<&Page>,
    fallback_title: &str,
    query: Option<&str>,
    max_chars: usize,
) -> String {
    let max_chars = max_chars.max(1);
    let text = page
        .map(|p| collapse_whitespace(&p.content))
        .unwrap_or_default();

    if text.is_empty() {
        return title_fallback(fallback_title);
    }

    let chars: Vec<char> = text.chars().collect();
    let start = query
        .and_then(|q| first_match(&chars, q))
        .map(|match_char| window_start(&chars, match_char))
        .unwrap_or(0);

    let end = (start + max_chars).min(chars.len());
    let end = trim_to_word(&chars, start, end);

    let mut snippet = String::new();
    if start > 0 {
        snippet.push_str(ELLIPSIS);
    }
    snippet.extend(&chars[start..end]);
    let mut snippet = snippet.trim_end().to_string();
    if end < chars.len() {
        snippet.push_str(ELLIPSIS);
    }
    snippet
}

fn title_fallback(fallback_title: &str) -> String {
    let title = collapse_whitespace(fallback_title);
    if title.is_empty() {
        NO_PREVIEW.to_string()
    } else {
        title
    }
}

/// Character index of the earliest whole-word match of any query term
///
/// Matching runs on the lowercased characters, each mapped back to the
/// character it came from, since lowercasing can change lengths.
fn first_match(chars: &[char], query: &str) -> Option<usize> {
    let mut lower: Vec<char> = Vec::with_capacity(chars.len());
    let mut origin: Vec<usize> = Vec::with_capacity(chars.len());
    for (i, c) in chars.iter().enumerate() {
        for lc in c.to_lowercase() {
            lower.push(lc);
            origin.push(i);
        }
    }

    query_terms(query)
        .iter()
        .filter_map(|term| {
            let needle: Vec<char> = term.chars().collect();
            if needle.is_empty() || needle.len() > lower.len() {
                return None;
            }
            (0..=lower.len() - needle.len())
                .find(|&pos| {
                    let end = pos + needle.len();
                    lower[pos..end] == needle[..]
                        && (pos == 0 || !lower[pos - 1].is_alphanumeric())
                        && lower.get(end).map_or(true, |c| !c.is_alphanumeric())
                })
                .map(|pos| origin[pos])
        })
        .min()
}

/// Character index where the window starts: a short lead-in before the
/// match, moved forward to the next word start
fn window_start(chars: &[char], match_char: usize) -> usize {
    if match_char <= SNIPPET_LEAD_CHARS {
        return 0;
    }
    let mut start = match_char - SNIPPET_LEAD_CHARS;
    while start < match_char && !chars[start - 1].is_whitespace() {
        start += 1;
    }
    start
}

/// Pull `end` back to a word boundary unless that would empty the window
fn trim_to_word(chars: &[char], start: usize, end: usize) -> usize {
    if end >= chars.len() || chars[end].is_whitespace() {
        return end;
    }
    let mut cut = end;
    while cut > start && !chars[cut - 1].is_whitespace() {
        cut -= 1;
    }
    if cut > start {
        cut
    } else {
        end
    }
}
