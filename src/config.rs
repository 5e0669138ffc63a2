//! Configuration for document processing.
//!
//! All runtime behaviour is controlled through [`ProcessConfig`], built via
//! its [`ProcessConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across requests and to diff two runs when their
//! outputs differ.

use crate::error::PipelineError;
use crate::model::{ArtifactPublisher, Embedder, InsightModel};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for one or more document-processing requests.
///
/// Built via [`ProcessConfig::builder()`] or [`ProcessConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_insight::ProcessConfig;
///
/// let config = ProcessConfig::builder()
///     .insight_concurrency(5)
///     .llm_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ProcessConfig {
    /// Maximum simultaneous in-flight insight calls per request. Default: 10.
    ///
    /// LLM APIs are network-bound; a cap of 10 typically cuts wall-clock time
    /// by 8-9x over sequential calls without tripping provider rate limits.
    /// Lower this if the provider returns 429s. The cap is per request, not
    /// process-wide.
    pub insight_concurrency: usize,

    /// Download timeout for URL inputs in seconds. Default: 60.
    ///
    /// A download timeout is fatal to the request.
    pub download_timeout_secs: u64,

    /// Per-insight-call timeout in seconds. Default: 60.
    ///
    /// An insight-call timeout degrades that candidate only.
    pub llm_timeout_secs: u64,

    /// Artifact-upload timeout in seconds. Default: 120.
    ///
    /// A publish timeout falls back to the original source reference.
    pub publish_timeout_secs: u64,

    /// Sampling temperature for insight generation. Default: 0.2.
    ///
    /// Low temperature keeps the model faithful to the paragraph, which
    /// matters for the verbatim-highlight contract.
    pub temperature: f32,

    /// Maximum tokens the model may generate per insight. Default: 1024.
    pub max_tokens: usize,

    /// Pre-constructed chat model. Takes precedence over `provider_name`.
    pub model: Option<Arc<dyn InsightModel>>,

    /// LLM provider name (e.g. "openai", "anthropic", "openrouter").
    /// If None along with `model`, the provider is auto-detected from the
    /// environment.
    pub provider_name: Option<String>,

    /// Model identifier, e.g. "gpt-4.1-nano". If None, the provider default
    /// is used.
    pub model_name: Option<String>,

    /// Embedding capability for chunk records. If None, chunk records are
    /// returned with empty embedding vectors.
    pub embedder: Option<Arc<dyn Embedder>>,

    /// Artifact publisher for the annotated PDF. If None (and no
    /// `output_path`), the response falls back to the original source
    /// reference.
    pub publisher: Option<Arc<dyn ArtifactPublisher>>,

    /// Persist the annotated PDF to this local path instead of (or in
    /// addition to) publishing. Used by the CLI.
    pub output_path: Option<PathBuf>,

    /// Custom system prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            insight_concurrency: 10,
            download_timeout_secs: 60,
            llm_timeout_secs: 60,
            publish_timeout_secs: 120,
            temperature: 0.2,
            max_tokens: 1024,
            model: None,
            provider_name: None,
            model_name: None,
            embedder: None,
            publisher: None,
            output_path: None,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("insight_concurrency", &self.insight_concurrency)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("model", &self.model.as_ref().map(|_| "<dyn InsightModel>"))
            .field("provider_name", &self.provider_name)
            .field("model_name", &self.model_name)
            .field("embedder", &self.embedder.as_ref().map(|_| "<dyn Embedder>"))
            .field(
                "publisher",
                &self.publisher.as_ref().map(|_| "<dyn ArtifactPublisher>"),
            )
            .field("output_path", &self.output_path)
            .finish()
    }
}

impl ProcessConfig {
    /// Create a new builder for `ProcessConfig`.
    pub fn builder() -> ProcessConfigBuilder {
        ProcessConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ProcessConfig`].
#[derive(Debug)]
pub struct ProcessConfigBuilder {
    config: ProcessConfig,
}

impl ProcessConfigBuilder {
    pub fn insight_concurrency(mut self, n: usize) -> Self {
        self.config.insight_concurrency = n.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn llm_timeout_secs(mut self, secs: u64) -> Self {
        self.config.llm_timeout_secs = secs;
        self
    }

    pub fn publish_timeout_secs(mut self, secs: u64) -> Self {
        self.config.publish_timeout_secs = secs;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn model(mut self, model: Arc<dyn InsightModel>) -> Self {
        self.config.model = Some(model);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.config.model_name = Some(name.into());
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.config.embedder = Some(embedder);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn ArtifactPublisher>) -> Self {
        self.config.publisher = Some(publisher);
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = Some(path.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ProcessConfig, PipelineError> {
        let c = &self.config;
        if c.insight_concurrency == 0 {
            return Err(PipelineError::InvalidConfig(
                "insight_concurrency must be >= 1".into(),
            ));
        }
        if c.llm_timeout_secs == 0 {
            return Err(PipelineError::InvalidConfig(
                "llm_timeout_secs must be >= 1".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ProcessConfig::default();
        assert_eq!(c.insight_concurrency, 10);
        assert_eq!(c.llm_timeout_secs, 60);
        assert_eq!(c.publish_timeout_secs, 120);
        assert!(c.model.is_none());
    }

    #[test]
    fn builder_clamps_concurrency() {
        let c = ProcessConfig::builder()
            .insight_concurrency(0)
            .build()
            .unwrap();
        assert_eq!(c.insight_concurrency, 1);
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = ProcessConfig::builder().temperature(5.0).build().unwrap();
        assert_eq!(c.temperature, 2.0);
    }
}
