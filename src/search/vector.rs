use std::cmp::Ordering;

use tracing::debug;

use super::models::{ScoredCandidate, SearchOptions};
use crate::core::config::CategoryWeights;
use crate::core::error::{RagError, Result};
use crate::embedding::EmbeddingError;
use crate::index::Index;

/// Cosine similarity in `[-1, 1]`. Total: mismatched lengths and zero
/// vectors score 0.0 instead of failing.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Embedding-similarity scorer. The query embedding is computed by the
/// caller; the channel itself is a pure computation over provided vectors.
///
/// Category weights shape the rank key only; the reported score stays the
/// unweighted cosine so confidence classification sees true similarity.
pub struct VectorChannel {
    weights: CategoryWeights,
}

impl VectorChannel {
    #[must_use]
    pub fn new(weights: CategoryWeights) -> Self {
        Self { weights }
    }

    /// Plain variant with no category shaping.
    #[must_use]
    pub fn unweighted() -> Self {
        Self::new(CategoryWeights::uniform())
    }

    pub fn rank(
        &self,
        index: &Index,
        query_vector: &[f32],
        opts: SearchOptions,
    ) -> Result<Vec<ScoredCandidate>> {
        let (dim, rows) = index.vectors()?;
        if index.is_empty() {
            debug!("vector: index is empty");
            return Ok(Vec::new());
        }
        if query_vector.len() != dim {
            return Err(RagError::Embedding(EmbeddingError::InvalidResponse(format!(
                "query vector has dimension {}, index has {}",
                query_vector.len(),
                dim
            ))));
        }

        let mut candidates: Vec<ScoredCandidate> = rows
            .iter()
            .enumerate()
            .map(|(passage_idx, row)| {
                let score = cosine_similarity(query_vector, row);
                let weight = self
                    .weights
                    .get(&index.passages()[passage_idx].metadata.category);
                ScoredCandidate {
                    passage_idx,
                    score,
                    rank_key: score * weight,
                }
            })
            .collect();

        Self::sort_truncate(&mut candidates, opts.k);
        // Threshold on the unweighted score, after weighted ranking.
        candidates.retain(|c| c.score >= opts.threshold);

        if candidates.is_empty() {
            debug!("vector: no candidate cleared threshold {}", opts.threshold);
        }
        Ok(candidates)
    }

    /// Score against the secondary-modality matrix (e.g. image vectors).
    /// Unweighted: rank key equals the cosine score.
    pub fn rank_secondary(
        &self,
        index: &Index,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<ScoredCandidate>> {
        let Some(secondary) = index.secondary_vectors() else {
            return Err(RagError::BackendMismatch {
                expected: "vector index with secondary modality".to_string(),
                found: index.backend().to_string(),
            });
        };
        if query_vector.len() != secondary.dim {
            return Err(RagError::Embedding(EmbeddingError::InvalidResponse(format!(
                "secondary query vector has dimension {}, index has {}",
                query_vector.len(),
                secondary.dim
            ))));
        }

        let mut candidates: Vec<ScoredCandidate> = secondary
            .rows
            .iter()
            .enumerate()
            .map(|(passage_idx, row)| {
                let score = cosine_similarity(query_vector, row);
                ScoredCandidate {
                    passage_idx,
                    score,
                    rank_key: score,
                }
            })
            .collect();

        Self::sort_truncate(&mut candidates, k);
        Ok(candidates)
    }

    fn sort_truncate(candidates: &mut Vec<ScoredCandidate>, k: usize) {
        candidates.sort_by(|a, b| {
            b.rank_key
                .partial_cmp(&a.rank_key)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(k);
    }
}
