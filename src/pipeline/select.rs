//! Paragraph selection: pick the blocks worth sending to the model.
//!
//! Small documents get full coverage; larger ones are ranked per page by
//! TF-IDF over the whole-document block corpus and capped at two candidates
//! per page. Selection is fully deterministic: scores are summed in term
//! first-appearance order and ties keep block order.

use crate::document::{Page, ParagraphCandidate};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Blocks at or below this whitespace-word count are treated as headings or
/// captions. Counted on whitespace so hyphenated terms stay one word.
const MIN_BLOCK_WORDS: usize = 15;
/// Documents under this page count skip ranking and take every filtered block.
const FULL_ANALYSIS_PAGE_LIMIT: usize = 10;
/// Per-page candidate cap in ranked mode.
const TOP_CANDIDATES_PER_PAGE: usize = 2;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// TF-IDF salience of one block against the document's block corpus.
///
/// `tf` is occurrences over block word count; `idf` is
/// `ln((N + 1) / (df + 1)) + 1` where `df` counts blocks whose lowercased
/// text contains the word as a substring. Terms contribute in
/// first-appearance order so repeated runs sum floats identically.
fn tf_idf_score(text: &str, corpus_lower: &[String]) -> f64 {
    let lower = text.to_lowercase();
    let words: Vec<&str> = WORD_RE.find_iter(&lower).map(|m| m.as_str()).collect();
    if words.is_empty() {
        return 0.0;
    }

    let n = corpus_lower.len() as f64;
    let mut seen: Vec<&str> = Vec::new();
    let mut score = 0.0;

    for &word in &words {
        if seen.contains(&word) {
            continue;
        }
        seen.push(word);
        let count = words.iter().filter(|&&w| w == word).count() as f64;
        let tf = count / words.len() as f64;
        let df = corpus_lower.iter().filter(|b| b.contains(word)).count() as f64;
        let idf = ((n + 1.0) / (df + 1.0)).ln() + 1.0;
        score += tf * idf;
    }

    score
}

/// Select paragraph candidates across the whole document.
///
/// Per page: keep blocks with more than [`MIN_BLOCK_WORDS`] words, falling
/// back to the page's first two raw blocks when none qualify. Output is
/// ordered by page, then by rank (ranked mode) or block order (full mode).
pub fn select_candidates(pages: &[Page]) -> Vec<ParagraphCandidate> {
    let rank = pages.len() >= FULL_ANALYSIS_PAGE_LIMIT;

    let corpus_lower: Vec<String> = if rank {
        pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .map(|b| b.text.to_lowercase())
            .collect()
    } else {
        Vec::new()
    };

    let mut candidates = Vec::new();

    for page in pages {
        let mut filtered: Vec<&str> = page
            .blocks
            .iter()
            .map(|b| b.text.as_str())
            .filter(|t| t.split_whitespace().count() > MIN_BLOCK_WORDS)
            .collect();

        if filtered.is_empty() {
            filtered = page.blocks.iter().take(2).map(|b| b.text.as_str()).collect();
        }

        if rank {
            let mut scored: Vec<(f64, &str)> = filtered
                .into_iter()
                .map(|t| (tf_idf_score(t, &corpus_lower), t))
                .collect();
            // stable sort keeps block order on ties
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            scored.truncate(TOP_CANDIDATES_PER_PAGE);
            for (_, text) in scored {
                candidates.push(ParagraphCandidate {
                    page_number: page.number,
                    text: text.to_string(),
                });
            }
        } else {
            for text in filtered {
                candidates.push(ParagraphCandidate {
                    page_number: page.number,
                    text: text.to_string(),
                });
            }
        }
    }

    debug!(
        "selected {} candidates from {} pages (ranked: {rank})",
        candidates.len(),
        pages.len()
    );
    candidates
}
