use thiserror::Error;

use crate::embedding::EmbeddingError;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index backend mismatch: expected {expected}, found {found}")]
    BackendMismatch { expected: String, found: String },

    #[error("Malformed index artifact: {0}")]
    MalformedArtifact(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
