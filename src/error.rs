//! Error types for the pdf-insight library.
//!
//! Two distinct failure modes exist and only one of them is represented here:
//!
//! * [`PipelineError`] — **Fatal**: the request cannot produce an annotated
//!   document at all (bad input, download failure, corrupt PDF, annotation
//!   write failure). Returned as `Err(PipelineError)` from the top-level
//!   `process*` functions.
//!
//! * **Degraded** failures — a single insight call, a phrase that cannot be
//!   located, an overlay that cannot be constructed, a failed publish. These
//!   never surface as errors: they are logged and replaced with empty values
//!   (empty insight text, no rectangles, the original source URL), so the
//!   caller always receives the full response shape.
//!
//! Small absorbed error types at the capability seams ([`ModelError`],
//! [`ServiceError`] in [`crate::model`]) exist so mock implementations in
//! tests have something honest to return; they never cross the orchestrator
//! boundary.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf-insight library.
///
/// Degraded per-candidate and per-phrase failures are absorbed inside their
/// stages rather than propagated here.
#[derive(Debug, Error)]
pub enum PipelineError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease the download timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// pdfium failed while reading the text layer.
    #[error("Text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    /// lopdf failed while writing the annotated document.
    #[error("Annotation failed: {detail}")]
    AnnotationFailed { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// No chat model could be resolved (missing API key etc.).
    #[error("Insight model '{provider}' is not configured.\n{hint}")]
    ModelNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the annotated output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_timeout_display() {
        let e = PipelineError::DownloadTimeout {
            url: "https://example.com/paper.pdf".into(),
            secs: 60,
        };
        let msg = e.to_string();
        assert!(msg.contains("60s"), "got: {msg}");
        assert!(msg.contains("example.com"));
    }

    #[test]
    fn not_a_pdf_display() {
        let e = PipelineError::NotAPdf {
            path: PathBuf::from("/tmp/x.pdf"),
            magic: *b"<htm",
        };
        assert!(e.to_string().contains("not a valid PDF"));
    }

    #[test]
    fn model_not_configured_display() {
        let e = PipelineError::ModelNotConfigured {
            provider: "openai".into(),
            hint: "set OPENAI_API_KEY".into(),
        };
        assert!(e.to_string().contains("openai"));
        assert!(e.to_string().contains("OPENAI_API_KEY"));
    }
}
