pub mod core;
pub mod embedding;
pub mod index;
pub mod search;

pub use crate::core::config::RagConfig;
pub use crate::core::error::{RagError, Result};
pub use crate::embedding::{EmbeddingError, EmbeddingProvider, OllamaEmbedder, OpenAiEmbedder};
pub use crate::index::{Index, Passage, PassageMetadata};
pub use crate::search::confidence::Confidence;
pub use crate::search::context::{safe_truncate_ellipsis, ConversationContext, ConversationTurn};
pub use crate::search::intent::QueryIntent;
pub use crate::search::models::{Retrieval, RetrievedPassage};
pub use crate::search::retriever::Retriever;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

pub const DEFAULT_CACHE_SIZE: usize = 1000;

pub const DEFAULT_CACHE_TTL: u64 = 300;
