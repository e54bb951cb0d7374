use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::confidence::{self, Confidence};
use super::fusion;
use super::lexical::LexicalChannel;
use super::models::{Retrieval, RetrievedPassage, ScoredCandidate, SearchOptions};
use super::vector::VectorChannel;
use crate::core::config::{ConfidenceThresholds, RagConfig};
use crate::core::error::{RagError, Result};
use crate::embedding::{EmbeddingCache, EmbeddingProvider};
use crate::index::keywords::extract_keywords;
use crate::index::{persist, Index, Passage, LEXICAL_BACKEND};

enum Channel {
    Lexical(LexicalChannel),
    Vector {
        channel: VectorChannel,
        provider: Arc<dyn EmbeddingProvider>,
        cache: EmbeddingCache,
    },
}

/// Retrieval engine facade: one passage index behind one channel.
///
/// Read-mostly: queries take a read lock over a fully built index and share
/// no mutable state; `add_passages` and `load` take the write lock, so a
/// reader never observes a partially extended index. Embedding calls happen
/// before any lock is held.
pub struct Retriever {
    config: RagConfig,
    index: RwLock<Index>,
    channel: Channel,
}

impl Retriever {
    /// Keyword-overlap retriever; fully local, no collaborators.
    #[must_use]
    pub fn lexical(config: RagConfig) -> Self {
        let channel = Channel::Lexical(LexicalChannel::new(config.lexical.clone()));
        Self {
            config,
            index: RwLock::new(Index::lexical()),
            channel,
        }
    }

    /// Embedding-similarity retriever with category-weighted ranking.
    #[must_use]
    pub fn vector(config: RagConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let index = RwLock::new(Index::vector(provider.model()));
        let channel = Channel::Vector {
            channel: VectorChannel::new(config.category_weights.clone()),
            cache: EmbeddingCache::new(config.cache_size, config.cache_ttl_secs),
            provider,
        };
        Self {
            config,
            index,
            channel,
        }
    }

    fn backend_id(&self) -> String {
        match &self.channel {
            Channel::Lexical(_) => LEXICAL_BACKEND.to_string(),
            Channel::Vector { provider, .. } => format!("vector:{}", provider.model()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    #[must_use]
    pub fn category_stats(&self) -> std::collections::BTreeMap<String, usize> {
        self.index.read().category_stats()
    }

    /// Index a batch of passages. For the vector backend the embeddings are
    /// computed up front; the index is extended in one locked append either
    /// way. Returns the new passage count.
    pub async fn add_passages(&self, passages: Vec<Passage>) -> Result<usize> {
        if passages.is_empty() {
            return Ok(self.len());
        }
        info!("Adding {} passages to the index", passages.len());

        match &self.channel {
            Channel::Lexical(_) => {
                let batch = passages
                    .into_iter()
                    .map(|p| {
                        let keywords = extract_keywords(&p.content);
                        (p, keywords)
                    })
                    .collect();
                self.index.write().append_lexical(batch)?;
            }
            Channel::Vector { provider, .. } => {
                let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
                let vectors = provider.embed_batch(&texts).await?;
                let batch = passages.into_iter().zip(vectors).collect();
                self.index.write().append_vector(batch, None)?;
            }
        }

        let total = self.len();
        info!("Index now holds {} passages", total);
        Ok(total)
    }

    /// Index passages together with precomputed secondary-modality vectors
    /// (vector backend only).
    pub async fn add_passages_with_secondary(
        &self,
        passages: Vec<Passage>,
        secondary: Vec<Vec<f32>>,
    ) -> Result<usize> {
        let Channel::Vector { provider, .. } = &self.channel else {
            return Err(RagError::BackendMismatch {
                expected: "vector:*".to_string(),
                found: self.backend_id(),
            });
        };

        let texts: Vec<String> = passages.iter().map(|p| p.content.clone()).collect();
        let vectors = provider.embed_batch(&texts).await?;
        let batch = passages.into_iter().zip(vectors).collect();
        self.index.write().append_vector(batch, Some(secondary))?;
        Ok(self.len())
    }

    /// Retrieve the top-k passages for a text query.
    pub async fn retrieve(&self, query: &str, k: usize, threshold: f64) -> Result<Retrieval> {
        let opts = SearchOptions::new(k, threshold);

        // Candidates hold positions into the index, so results are
        // materialized under the same read lock that ranked them; a
        // concurrent `load` cannot swap the index in between.
        let retrieval = match &self.channel {
            Channel::Lexical(channel) => {
                let index = self.index.read();
                let candidates = channel.rank(&index, query, opts)?;
                Self::build_retrieval(&index, candidates, self.config.lexical_confidence)
            }
            Channel::Vector {
                channel,
                provider,
                cache,
            } => {
                let query_vector = Self::embed_query(provider.as_ref(), cache, query).await?;
                let index = self.index.read();
                let candidates = channel.rank(&index, &query_vector, opts)?;
                Self::build_retrieval(&index, candidates, self.config.vector_confidence)
            }
        };

        if retrieval.results.is_empty() {
            warn!("Retrieval returned no results for query");
        }
        Ok(retrieval)
    }

    /// Retrieve by a precomputed secondary-modality vector (e.g. an image
    /// embedding). No threshold; the caller gets the k nearest passages.
    pub fn retrieve_with_secondary(&self, vector: &[f32], k: usize) -> Result<Retrieval> {
        let Channel::Vector { channel, .. } = &self.channel else {
            return Err(RagError::BackendMismatch {
                expected: "vector:*".to_string(),
                found: self.backend_id(),
            });
        };

        let index = self.index.read();
        let candidates = channel.rank_secondary(&index, vector, k)?;
        Ok(Self::build_retrieval(
            &index,
            candidates,
            self.config.vector_confidence,
        ))
    }

    /// Hybrid retrieval: text channel and secondary channel each produce up
    /// to `2k` candidates, fused as `weight * text + (1 - weight) * secondary`.
    pub async fn retrieve_hybrid(
        &self,
        query: &str,
        secondary_vector: &[f32],
        k: usize,
        weight: f64,
    ) -> Result<Retrieval> {
        let Channel::Vector {
            channel,
            provider,
            cache,
        } = &self.channel
        else {
            return Err(RagError::BackendMismatch {
                expected: "vector:*".to_string(),
                found: self.backend_id(),
            });
        };

        let query_vector = Self::embed_query(provider.as_ref(), cache, query).await?;

        let index = self.index.read();
        let text_candidates = channel.rank(
            &index,
            &query_vector,
            SearchOptions::new(2 * k, self.config.default_threshold),
        )?;
        let secondary_candidates = channel.rank_secondary(&index, secondary_vector, 2 * k)?;
        let fused = fusion::fuse_weighted(&text_candidates, &secondary_candidates, k, weight);

        Ok(Self::build_retrieval(
            &index,
            fused,
            self.config.vector_confidence,
        ))
    }

    /// Classify confidence for an externally assembled score list, using
    /// the active channel's threshold scale.
    #[must_use]
    pub fn confidence(&self, scores: &[f64]) -> Confidence {
        let thresholds = match &self.channel {
            Channel::Lexical(_) => self.config.lexical_confidence,
            Channel::Vector { .. } => self.config.vector_confidence,
        };
        confidence::classify(scores, &thresholds)
    }

    /// Persist the index as one versioned artifact (atomic write).
    pub fn save(&self, path: &Path) -> Result<()> {
        let index = self.index.read();
        persist::save(&index, path)
    }

    /// Replace the index from a persisted artifact in a single swap. The
    /// artifact's backend tag must match the active channel.
    pub fn load(&self, path: &Path) -> Result<()> {
        let loaded = persist::load(path, &self.backend_id())?;
        *self.index.write() = loaded;
        Ok(())
    }

    async fn embed_query(
        provider: &dyn EmbeddingProvider,
        cache: &EmbeddingCache,
        query: &str,
    ) -> Result<Vec<f32>> {
        let key = EmbeddingCache::make_key(provider.model(), query);
        if let Some(vector) = cache.get(&key) {
            debug!("Embedding cache hit");
            return Ok(vector);
        }
        let vector = provider.embed(query).await?;
        cache.set(&key, vector.clone());
        Ok(vector)
    }

    /// Resolve candidate positions against the index they were ranked on.
    /// The caller keeps the read lock across ranking and this call.
    fn build_retrieval(
        index: &Index,
        candidates: Vec<ScoredCandidate>,
        thresholds: ConfidenceThresholds,
    ) -> Retrieval {
        let results: Vec<RetrievedPassage> = candidates
            .into_iter()
            .map(|c| {
                let passage = &index.passages()[c.passage_idx];
                RetrievedPassage {
                    content: passage.content.clone(),
                    metadata: passage.metadata.clone(),
                    score: c.score,
                }
            })
            .collect();

        let scores: Vec<f64> = results.iter().map(|r| r.score).collect();
        let confidence = confidence::classify(&scores, &thresholds);
        Retrieval {
            results,
            confidence,
        }
    }
}
