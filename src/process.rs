//! Full-document processing entry points.
//!
//! Stage order is strict and concurrency lives only inside insight
//! generation. The page-search view is built once per page after extraction
//! and shared read-only by every phrase resolution; the document itself is
//! only mutated in the final annotation pass, after all reads are done.

use crate::config::ProcessConfig;
use crate::document::Page;
use crate::error::PipelineError;
use crate::model::{resolve_model, ArtifactPublisher};
use crate::output::{InsightRecord, ProcessOutput, ProcessRequest, ProcessStats};
use crate::pipeline::{annotate, chunk, extract, input, insight, locate, search, select};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Process one document end to end.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `request` — document/project identity and the source path or URL
/// * `config` — processing configuration
///
/// # Returns
/// `Ok(ProcessOutput)` on success, even when individual insights degraded
/// (check `output.stats.degraded_insights`).
///
/// # Errors
/// Returns `Err(PipelineError)` only for fatal errors: unresolvable input,
/// corrupt PDF, extraction or annotation failure, or an unwritable output
/// path. Model-call, embedding, and publish failures degrade instead.
pub async fn process(
    request: &ProcessRequest,
    config: &ProcessConfig,
) -> Result<ProcessOutput, PipelineError> {
    let total_start = Instant::now();
    info!("Processing document '{}' from {}", request.document_id, request.source);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_source(&request.source, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Resolve model ────────────────────────────────────────────
    let model = resolve_model(config)?;

    // ── Step 3: Extract pages ────────────────────────────────────────────
    let extract_start = Instant::now();
    let extracted = extract::extract_pages(&pdf_path).await?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    let pages: Vec<Page> = extracted.iter().map(|e| e.page.clone()).collect();
    let page_count = pages.len();
    info!("Extracted {page_count} pages in {extract_duration_ms}ms");

    // ── Step 4: Chunk and embed ──────────────────────────────────────────
    let raw_chunks = chunk::chunk_pages(&pages);
    let chunks = chunk::embed_chunks(raw_chunks, config.embedder.as_ref()).await;

    // ── Step 5: Select paragraph candidates ──────────────────────────────
    let candidates = select::select_candidates(&pages);
    info!("Selected {} paragraph candidates", candidates.len());

    // ── Step 6: Generate insights ────────────────────────────────────────
    let insight_start = Instant::now();
    let results = insight::generate_insights(&candidates, model, config).await;
    let insight_duration_ms = insight_start.elapsed().as_millis() as u64;
    let degraded_insights = results
        .iter()
        .filter(|r| r.insight_text.is_empty() && r.raw_highlights.is_empty())
        .count();

    // ── Step 7: Resolve highlight phrases ────────────────────────────────
    // one shared search view per page that actually carries insights
    let mut indexes: HashMap<usize, search::TextIndex> = HashMap::new();
    for result in &results {
        if let Some(page) = extracted.get(result.page_number.wrapping_sub(1)) {
            indexes
                .entry(result.page_number)
                .or_insert_with(|| search::TextIndex::build(&page.chars));
        }
    }

    let mut highlights_resolved = 0usize;
    let insights: Vec<InsightRecord> = results
        .into_iter()
        .map(|r| {
            let page_blocks = pages
                .get(r.page_number.wrapping_sub(1))
                .map(|p| p.blocks.as_slice())
                .unwrap_or(&[]);
            let index = indexes.get(&r.page_number);
            let highlights = locate::resolve_all(
                &r.raw_highlights,
                page_blocks,
                index.map(|i| i as &dyn search::PageSearch),
            );
            highlights_resolved += highlights.len();
            InsightRecord {
                page_number: r.page_number,
                insight_text: r.insight_text,
                highlights,
            }
        })
        .collect();
    info!("Resolved {highlights_resolved} highlight rectangles");

    // ── Step 8: Annotate ─────────────────────────────────────────────────
    let workdir = tempfile::tempdir()
        .map_err(|e| PipelineError::Internal(format!("tempdir: {e}")))?;
    let annotated_name = format!("{}_annotated.pdf", request.document_id);
    let annotated_path = workdir.path().join(&annotated_name);
    let page_heights: Vec<f32> = pages.iter().map(|p| p.height).collect();
    annotate::annotate_pdf(&pdf_path, &annotated_path, &insights, &page_heights).await?;

    // ── Step 9: Persist and publish ──────────────────────────────────────
    if let Some(output_path) = &config.output_path {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    PipelineError::OutputWriteFailed {
                        path: output_path.clone(),
                        source: e,
                    }
                })?;
            }
        }
        tokio::fs::copy(&annotated_path, output_path)
            .await
            .map_err(|e| PipelineError::OutputWriteFailed {
                path: output_path.clone(),
                source: e,
            })?;
        info!("Wrote annotated PDF to {}", output_path.display());
    }

    let annotated_file_url = match &config.publisher {
        Some(publisher) => match publish_with_timeout(
            publisher.as_ref(),
            &annotated_path,
            &annotated_name,
            config.publish_timeout_secs,
        )
        .await
        {
            Some(url) => {
                info!("Published annotated PDF: {url}");
                url
            }
            None => request.source.clone(),
        },
        None => match &config.output_path {
            Some(path) => format!("file://{}", path.display()),
            None => request.source.clone(),
        },
    };
    // `workdir` and the downloaded source drop here, exactly once per run

    // ── Step 10: Assemble output ─────────────────────────────────────────
    let stats = ProcessStats {
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        extract_duration_ms,
        insight_duration_ms,
        insights_generated: insights.len(),
        highlights_resolved,
        degraded_insights,
    };

    info!(
        "Processing complete: {} insights, {} highlights, {}ms total",
        stats.insights_generated, stats.highlights_resolved, stats.total_duration_ms
    );

    Ok(ProcessOutput {
        page_count,
        chunks,
        insights,
        annotated_file_url,
        stats,
    })
}

/// Publish the annotated artifact under the configured timeout.
///
/// Returns `None` on failure or timeout; the caller falls back to the
/// original source reference. A misbehaving publisher must never hang the
/// request past its deadline.
async fn publish_with_timeout(
    publisher: &dyn ArtifactPublisher,
    file: &Path,
    file_name: &str,
    timeout_secs: u64,
) -> Option<String> {
    let deadline = Duration::from_secs(timeout_secs);
    match tokio::time::timeout(deadline, publisher.publish(file, file_name)).await {
        Ok(Ok(url)) => Some(url),
        Ok(Err(e)) => {
            warn!("Publish failed, falling back to original source: {e}");
            None
        }
        Err(_) => {
            warn!("Publish timed out after {timeout_secs}s, falling back to original source");
            None
        }
    }
}

/// Process raw PDF bytes in memory.
///
/// Writes `bytes` to a managed [`tempfile`] that is cleaned up on return or
/// panic. Recommended when PDF data comes from a database or network stream
/// rather than a file on disk.
pub async fn process_from_bytes(
    bytes: &[u8],
    request: &ProcessRequest,
    config: &ProcessConfig,
) -> Result<ProcessOutput, PipelineError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| PipelineError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| PipelineError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    let request = ProcessRequest {
        document_id: request.document_id.clone(),
        project_id: request.project_id.clone(),
        source: path,
    };
    // `tmp` is dropped (and the file deleted) when `process` returns
    process(&request, config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceError;
    use async_trait::async_trait;

    struct SlowPublisher;

    #[async_trait]
    impl ArtifactPublisher for SlowPublisher {
        async fn publish(&self, _file: &Path, _name: &str) -> Result<String, ServiceError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("https://files.example.com/never.pdf".into())
        }
    }

    struct InstantPublisher;

    #[async_trait]
    impl ArtifactPublisher for InstantPublisher {
        async fn publish(&self, _file: &Path, name: &str) -> Result<String, ServiceError> {
            Ok(format!("https://files.example.com/{name}"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_publish_falls_back_after_timeout() {
        let url = publish_with_timeout(&SlowPublisher, Path::new("/tmp/x.pdf"), "x.pdf", 120).await;
        assert!(url.is_none());
    }

    #[tokio::test]
    async fn successful_publish_returns_url() {
        let url =
            publish_with_timeout(&InstantPublisher, Path::new("/tmp/x.pdf"), "x.pdf", 120).await;
        assert_eq!(url.as_deref(), Some("https://files.example.com/x.pdf"));
    }
}
