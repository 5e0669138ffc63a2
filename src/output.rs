//! Request and response contract for document processing.

use crate::document::ResolvedHighlight;
use serde::{Deserialize, Serialize};

/// Identifies one document-processing job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Caller-side document identifier, used to name the annotated artifact.
    pub document_id: String,
    /// Caller-side project identifier, echoed back untouched.
    pub project_id: String,
    /// Local file path or HTTP(S) URL of the source PDF.
    pub source: String,
}

/// One insight with its resolved highlights, ordered by page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRecord {
    pub page_number: usize,
    /// Empty when the model call for this candidate degraded.
    pub insight_text: String,
    pub highlights: Vec<ResolvedHighlight>,
}

/// One text chunk with its page of origin and embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub page_number: usize,
    /// Empty when no embedder is configured or embedding degraded.
    pub embedding: Vec<f32>,
}

/// Timing and quality counters for one processing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessStats {
    pub total_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub insight_duration_ms: u64,
    /// Candidates sent to the model (equals insight records returned).
    pub insights_generated: usize,
    /// Phrases resolved to at least one rectangle.
    pub highlights_resolved: usize,
    /// Candidates whose model call failed or returned unparseable output.
    pub degraded_insights: usize,
}

/// Full result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOutput {
    pub page_count: usize,
    pub chunks: Vec<ChunkRecord>,
    /// Ascending by `page_number`, one record per selected candidate.
    pub insights: Vec<InsightRecord>,
    /// Durable URL of the annotated artifact, or the original source
    /// reference when publishing was skipped or failed.
    pub annotated_file_url: String,
    pub stats: ProcessStats,
}
