//! # pdf-insight
//!
//! Turn a PDF research document into an annotated copy carrying AI-generated
//! insights and precisely placed text highlights.
//!
//! ## Why this crate?
//!
//! Reading a long paper means finding the few paragraphs that matter. This
//! crate selects salient paragraphs with TF-IDF, asks a language model for a
//! short insight plus verbatim phrases worth highlighting, locates those
//! phrases as exact rectangles on the page, and burns non-destructive
//! highlight overlays into a copy of the PDF. The original text layer stays
//! searchable; the highlights are ordinary annotation objects any viewer can
//! toggle.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Extract   per-character text + geometry via pdfium (spawn_blocking)
//!  ├─ 3. Chunk     word-bounded chunks + batched embeddings (side channel)
//!  ├─ 4. Select    TF-IDF paragraph candidates, top 2 per page
//!  ├─ 5. Insight   concurrent LLM calls under a semaphore (default 10)
//!  ├─ 6. Locate    phrase → rectangles (exact / anchor / keyword / legacy)
//!  ├─ 7. Annotate  /Highlight overlays written via lopdf (spawn_blocking)
//!  └─ 8. Publish   upload artifact, fall back to the original source
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_insight::{process, ProcessConfig, ProcessRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ProcessConfig::builder()
//!         .output_path("annotated.pdf")
//!         .build()?;
//!     let request = ProcessRequest {
//!         document_id: "doc-1".into(),
//!         project_id: "proj-1".into(),
//!         source: "paper.pdf".into(),
//!     };
//!     let output = process(&request, &config).await?;
//!     println!("{} insights on {} pages", output.insights.len(), output.page_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-insight` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf-insight = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProcessConfig, ProcessConfigBuilder};
pub use document::{BBox, InsightResult, Page, ParagraphCandidate, ResolvedHighlight, TextBlock};
pub use error::PipelineError;
pub use model::{ArtifactPublisher, Embedder, InsightModel, ModelError, ServiceError};
pub use output::{ChunkRecord, InsightRecord, ProcessOutput, ProcessRequest, ProcessStats};
pub use process::{process, process_from_bytes};
