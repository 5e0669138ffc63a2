//! Pipeline stages for PDF insight annotation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different extraction backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ select ──▶ insight ──▶ locate ──▶ annotate
//! (URL/path) (pdfium)   (TF-IDF)    (LLM)     (search)    (lopdf)
//!                └─▶ chunk (embeddings, side channel)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local file
//! 2. [`extract`]  — per-character text and geometry via pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`search`]   — read-only per-page substring index over the extracted
//!    characters, shared by all phrase resolutions
//! 4. [`select`]   — TF-IDF paragraph selection over the block corpus
//! 5. [`chunk`]    — word-bounded chunks plus batched embeddings for retrieval
//! 6. [`insight`]  — bounded-concurrency model fan-out; the only stage with
//!    LLM network I/O
//! 7. [`locate`]   — phrase-to-rectangle resolution strategy chain
//! 8. [`annotate`] — highlight overlay objects written via lopdf, on the
//!    blocking pool

pub mod annotate;
pub mod chunk;
pub mod extract;
pub mod input;
pub mod insight;
pub mod locate;
pub mod search;
pub mod select;
