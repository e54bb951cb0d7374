pub mod cache;
mod ollama;
mod openai;

pub use cache::EmbeddingCache;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::RagConfig;
use crate::core::error::RagError;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Empty batch")]
    EmptyBatch,

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),
}

/// Boundary to the embedding collaborator.
///
/// Implementations turn text into fixed-dimension vectors; failures are
/// propagated to the caller as-is, the retrieval engine never retries or
/// falls back on its own.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn model(&self) -> &str;
}

/// Build the provider named in the configuration.
pub fn provider_from_config(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>, RagError> {
    match config.embedding_provider.to_lowercase().as_str() {
        "openai" => Ok(Arc::new(OpenAiEmbedder::new(
            config.embedding_api_key.clone().ok_or_else(|| {
                RagError::Config("OpenAI embedding provider requires an API key".to_string())
            })?,
            &config.embedding_model,
            config.embedding_base_url.clone(),
            config.embedding_timeout_secs,
            config.embedding_batch_size,
        ))),
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            &config.embedding_url,
            &config.embedding_model,
            config.embedding_timeout_secs,
        ))),
        other => Err(EmbeddingError::NotImplemented(other.to_string()).into()),
    }
}
