//! Insight generation: bounded-concurrency fan-out over the chat model.
//!
//! Every paragraph candidate becomes exactly one [`InsightResult`], in the
//! original candidate order restored after the concurrent phase. A failed or
//! unparseable call degrades its own candidate to an empty result; the batch
//! never aborts.

use crate::config::ProcessConfig;
use crate::document::{InsightResult, ParagraphCandidate};
use crate::model::InsightModel;
use crate::prompts::{paragraph_message, INSIGHT_SYSTEM_PROMPT};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// The JSON shape the model is instructed to return.
///
/// Both fields default so a reply carrying only one of them still parses.
#[derive(Debug, Deserialize)]
struct ModelReply {
    #[serde(default)]
    insight: String,
    #[serde(default)]
    highlights: Vec<String>,
}

/// Models often wrap JSON in markdown fences despite instructions.
static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").unwrap());

/// Parse a raw model reply, stripping markdown fences first.
fn parse_model_reply(raw: &str) -> Option<ModelReply> {
    let trimmed = raw.trim();
    let body = match FENCE_RE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    };
    serde_json::from_str(body.trim()).ok()
}

fn degraded(page_number: usize) -> InsightResult {
    InsightResult {
        page_number,
        insight_text: String::new(),
        raw_highlights: Vec::new(),
    }
}

/// Generate one insight per candidate, at most `insight_concurrency` calls
/// in flight at once.
///
/// The output is sorted by ascending page number, ties keeping candidate
/// order, and always has the same length as the input.
pub async fn generate_insights(
    candidates: &[ParagraphCandidate],
    model: Arc<dyn InsightModel>,
    config: &ProcessConfig,
) -> Vec<InsightResult> {
    if candidates.is_empty() {
        return Vec::new();
    }

    let system_prompt = config
        .system_prompt
        .clone()
        .unwrap_or_else(|| INSIGHT_SYSTEM_PROMPT.to_string());
    let semaphore = Arc::new(Semaphore::new(config.insight_concurrency));
    let timeout = Duration::from_secs(config.llm_timeout_secs);

    let mut handles = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let model = Arc::clone(&model);
        let semaphore = Arc::clone(&semaphore);
        let system = system_prompt.clone();
        let page_number = candidate.page_number;
        let user = paragraph_message(&candidate.text);

        handles.push(tokio::spawn(async move {
            // closed only if the semaphore is dropped, which cannot happen here
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, degraded(page_number));
            };

            let reply = tokio::time::timeout(timeout, model.complete(&system, &user)).await;
            let result = match reply {
                Ok(Ok(raw)) => match parse_model_reply(&raw) {
                    Some(parsed) => {
                        debug!(
                            "page {page_number}: insight with {} highlight phrases",
                            parsed.highlights.len()
                        );
                        InsightResult {
                            page_number,
                            insight_text: parsed.insight,
                            raw_highlights: parsed.highlights,
                        }
                    }
                    None => {
                        warn!("page {page_number}: unparseable model reply, degrading");
                        degraded(page_number)
                    }
                },
                Ok(Err(e)) => {
                    warn!("page {page_number}: model call failed, degrading: {e}");
                    degraded(page_number)
                }
                Err(_) => {
                    warn!("page {page_number}: model call timed out, degrading");
                    degraded(page_number)
                }
            };
            (index, result)
        }));
    }

    let joined = futures::future::join_all(handles).await;
    let mut results = Vec::with_capacity(candidates.len());
    for (index, joined_result) in joined.into_iter().enumerate() {
        match joined_result {
            Ok(pair) => results.push(pair),
            Err(e) => {
                warn!("insight task panicked, degrading: {e}");
                results.push((index, degraded(candidates[index].page_number)));
            }
        }
    }

    // completion order is arbitrary; restore candidate order within pages
    results.sort_by_key(|(index, r)| (r.page_number, *index));
    results.into_iter().map(|(_, r)| r).collect()
}
