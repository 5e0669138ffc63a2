//! Phrase localization: map model-nominated phrases to page rectangles.
//!
//! Resolvers run in a fixed order and the first one producing rectangles
//! wins. When a page-search view exists the chain is exact match, truncated
//! anchor, then keyword fallback; without one the legacy block-containment
//! path runs alone. Whatever resolver matched, the reported highlight always
//! carries the originally requested phrase, never the internal anchor.
//! Unmatched phrases are silently omitted.

use crate::document::{ResolvedHighlight, TextBlock};
use crate::pipeline::search::PageSearch;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Phrases longer than this search by prefix instead.
const EXACT_ANCHOR_MAX_CHARS: usize = 140;
/// Containment retry prefix length.
const CONTAINMENT_ANCHOR_CHARS: usize = 30;
/// Keyword fallback takes at most this many tokens.
const MAX_KEYWORDS: usize = 3;
/// Tokens shorter than this carry too little signal.
const KEYWORD_MIN_LEN: usize = 4;
/// Rectangles kept from the first matching keyword.
const KEYWORD_MAX_RECTS: usize = 2;

static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9\-_/]*").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "if", "then", "else", "for", "to", "of", "in", "on",
    "at", "by", "with", "from", "as", "is", "are", "was", "were", "be", "been", "being", "this",
    "that", "these", "those", "it", "its", "their", "his", "her", "our", "your", "we", "you",
    "they", "he", "she", "not", "than", "into", "about",
];

/// Collapse whitespace runs to single spaces and trim.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// First `n` characters of `s`, respecting char boundaries.
fn prefix_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((byte_index, _)) => &s[..byte_index],
        None => s,
    }
}

/// Candidate keywords from a phrase: alphanumeric tokens of useful length,
/// stopwords removed, deduplicated in first-appearance order.
fn extract_keywords(phrase: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for token in KEYWORD_RE.find_iter(phrase) {
        let lower = token.as_str().to_lowercase();
        if lower.chars().count() < KEYWORD_MIN_LEN {
            continue;
        }
        if STOPWORDS.contains(&lower.as_str()) {
            continue;
        }
        if !keywords.contains(&lower) {
            keywords.push(lower);
        }
        if keywords.len() == MAX_KEYWORDS {
            break;
        }
    }
    keywords
}

/// Exact search of the whole normalized phrase.
fn resolve_exact(phrase: &str, search: &dyn PageSearch) -> Vec<ResolvedHighlight> {
    search
        .find(phrase)
        .into_iter()
        .map(|bbox| ResolvedHighlight {
            text: phrase.to_string(),
            bbox,
        })
        .collect()
}

/// Prefix search for over-long phrases, tagged with the full phrase.
fn resolve_anchor(phrase: &str, search: &dyn PageSearch) -> Vec<ResolvedHighlight> {
    if phrase.chars().count() <= EXACT_ANCHOR_MAX_CHARS {
        return Vec::new();
    }
    let anchor = prefix_chars(phrase, EXACT_ANCHOR_MAX_CHARS);
    search
        .find(anchor)
        .into_iter()
        .map(|bbox| ResolvedHighlight {
            text: phrase.to_string(),
            bbox,
        })
        .collect()
}

/// Keyword fallback: first keyword with any hits contributes up to
/// [`KEYWORD_MAX_RECTS`] rectangles, tagged with the full phrase.
fn resolve_keywords(phrase: &str, search: &dyn PageSearch) -> Vec<ResolvedHighlight> {
    for keyword in extract_keywords(phrase) {
        let rects = search.find(&keyword);
        if !rects.is_empty() {
            debug!("phrase resolved via keyword '{keyword}'");
            return rects
                .into_iter()
                .take(KEYWORD_MAX_RECTS)
                .map(|bbox| ResolvedHighlight {
                    text: phrase.to_string(),
                    bbox,
                })
                .collect();
        }
    }
    Vec::new()
}

/// Legacy containment over text blocks, for pages without a search view.
///
/// Finds the first block containing the normalized phrase as a substring,
/// retrying with a 30-character prefix when the full phrase is longer and
/// unmatched. At most one rectangle, the whole block's.
fn resolve_containment(phrase: &str, blocks: &[TextBlock]) -> Vec<ResolvedHighlight> {
    let needle = normalize_whitespace(phrase).to_lowercase();

    let find = |needle: &str| -> Option<ResolvedHighlight> {
        blocks
            .iter()
            .find(|b| normalize_whitespace(&b.text).to_lowercase().contains(needle))
            .map(|b| ResolvedHighlight {
                text: phrase.to_string(),
                bbox: b.bbox,
            })
    };

    if let Some(hit) = find(&needle) {
        return vec![hit];
    }
    if needle.chars().count() > CONTAINMENT_ANCHOR_CHARS {
        let anchor = prefix_chars(&needle, CONTAINMENT_ANCHOR_CHARS);
        if let Some(hit) = find(anchor) {
            return vec![hit];
        }
    }
    Vec::new()
}

/// Resolve one phrase on one page.
///
/// Blank phrases are skipped before any search runs.
pub fn resolve_phrase(
    phrase: &str,
    blocks: &[TextBlock],
    search: Option<&dyn PageSearch>,
) -> Vec<ResolvedHighlight> {
    let normalized = normalize_whitespace(phrase);
    if normalized.is_empty() {
        return Vec::new();
    }

    match search {
        Some(search) => {
            let exact = resolve_exact(&normalized, search);
            if !exact.is_empty() {
                return retag(exact, phrase);
            }
            let anchored = resolve_anchor(&normalized, search);
            if !anchored.is_empty() {
                return retag(anchored, phrase);
            }
            retag(resolve_keywords(&normalized, search), phrase)
        }
        None => resolve_containment(phrase, blocks),
    }
}

/// Replace resolver-internal text with the phrase the caller asked for.
fn retag(mut hits: Vec<ResolvedHighlight>, phrase: &str) -> Vec<ResolvedHighlight> {
    for hit in &mut hits {
        hit.text = phrase.to_string();
    }
    hits
}

/// Resolve every phrase of one insight against its page.
pub fn resolve_all(
    phrases: &[String],
    blocks: &[TextBlock],
    search: Option<&dyn PageSearch>,
) -> Vec<ResolvedHighlight> {
    phrases
        .iter()
        .flat_map(|p| resolve_phrase(p, blocks, search))
        .collect()
}
