//! Capability seams for the pipeline: chat model, embedder, and publisher.
//!
//! The orchestrator only sees the traits defined here. Production wiring uses
//! edgequake-llm providers for chat and reqwest-backed HTTP services for
//! embedding and artifact upload; tests substitute in-process mocks.

use crate::config::ProcessConfig;
use crate::error::PipelineError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from a single chat-model call. Absorbed by the insight stage.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model call failed: {0}")]
    Call(String),

    #[error("model call timed out after {0}s")]
    Timeout(u64),
}

/// Errors from embedding or publishing. Absorbed by their stages.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected response: {0}")]
    Response(String),
}

/// Chat-completion capability used for insight generation.
///
/// One call per paragraph candidate. Implementations must be safe to share
/// across concurrent tasks.
#[async_trait]
pub trait InsightModel: Send + Sync {
    /// Run one completion and return the raw reply text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;

    /// Human-readable identifier for logs.
    fn name(&self) -> &str {
        "insight-model"
    }
}

/// Text-embedding capability for chunk records.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError>;
}

/// Durable-storage capability for the annotated artifact.
#[async_trait]
pub trait ArtifactPublisher: Send + Sync {
    /// Upload the file and return its durable URL.
    async fn publish(&self, file: &Path, file_name: &str) -> Result<String, ServiceError>;
}

/// [`InsightModel`] backed by an edgequake-llm provider.
pub struct EdgequakeModel {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: f32,
    max_tokens: usize,
}

impl EdgequakeModel {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        temperature: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl InsightModel for EdgequakeModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| ModelError::Call(e.to_string()))?;
        Ok(response.content)
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Default model when the caller names a provider but no model.
const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Instantiate a named provider with the given model.
fn create_named_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, PipelineError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PipelineError::ModelNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the chat model, from most-specific to least-specific.
///
/// 1. **Pre-built model** (`config.model`) — used as-is. Useful in tests or
///    when the caller needs custom middleware around the provider.
/// 2. **Named provider + model** (`config.provider_name`) — the factory reads
///    the corresponding API key (`OPENAI_API_KEY`, etc.) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`) —
///    checked before full auto-detection so the model choice is honoured even
///    when multiple API keys are present.
/// 4. **OpenAI preference** — an `OPENAI_API_KEY` in the environment selects
///    OpenAI over other detected providers.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_model(config: &ProcessConfig) -> Result<Arc<dyn InsightModel>, PipelineError> {
    if let Some(model) = &config.model {
        debug!("using pre-configured insight model: {}", model.name());
        return Ok(Arc::clone(model));
    }

    let wrap = |provider: Arc<dyn LLMProvider>, label: String| -> Arc<dyn InsightModel> {
        Arc::new(EdgequakeModel::new(
            provider,
            label,
            config.temperature,
            config.max_tokens,
        ))
    };

    if let Some(ref name) = config.provider_name {
        let model = config.model_name.as_deref().unwrap_or(DEFAULT_MODEL);
        info!("using configured provider: {name} ({model})");
        return Ok(wrap(create_named_provider(name, model)?, name.clone()));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            info!("using provider from environment: {prov} ({model})");
            return Ok(wrap(create_named_provider(&prov, &model)?, prov.clone()));
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model_name.as_deref().unwrap_or(DEFAULT_MODEL);
            info!("using OpenAI ({model}), OPENAI_API_KEY detected");
            return Ok(wrap(create_named_provider("openai", model)?, "openai".into()));
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PipelineError::ModelNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;
    info!("auto-detected provider from environment");
    Ok(wrap(llm_provider, "auto".into()))
}

/// [`Embedder`] calling an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedRow>,
}

#[derive(Deserialize)]
struct EmbedRow {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ServiceError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbedRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ServiceError::Response(format!(
                "embeddings endpoint returned {}",
                response.status()
            )));
        }
        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Response(e.to_string()))?;
        if body.data.len() != texts.len() {
            return Err(ServiceError::Response(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }
        Ok(body.data.into_iter().map(|r| r.embedding).collect())
    }
}

/// [`ArtifactPublisher`] uploading via multipart HTTP.
///
/// Expects a JSON response carrying the stored file's URL under `fileUrl`.
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct PublishResponse {
    #[serde(rename = "fileUrl")]
    file_url: String,
}

impl HttpPublisher {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ArtifactPublisher for HttpPublisher {
    async fn publish(&self, file: &Path, file_name: &str) -> Result<String, ServiceError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ServiceError::Request(format!("read {}: {e}", file.display())))?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Request(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ServiceError::Response(format!(
                "upload endpoint returned {}",
                response.status()
            )));
        }
        let body: PublishResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Response(e.to_string()))?;
        Ok(body.file_url)
    }
}
