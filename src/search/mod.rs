pub mod confidence;
pub mod context;
pub mod fusion;
pub mod intent;
pub mod lexical;
pub mod models;
pub mod retriever;
pub mod vector;

pub use confidence::Confidence;
pub use context::{ConversationContext, ConversationTurn};
pub use intent::QueryIntent;
pub use lexical::LexicalChannel;
pub use models::{Retrieval, RetrievedPassage, ScoredCandidate, SearchOptions};
pub use retriever::Retriever;
pub use vector::{cosine_similarity, VectorChannel};
