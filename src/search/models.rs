use serde::Serialize;

use super::confidence::Confidence;
use crate::index::PassageMetadata;

/// A passage scored by one channel.
///
/// `score` is what the caller sees; `rank_key` is the boosted/weighted value
/// used only for ordering and never reaches confidence classification.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub passage_idx: usize,
    pub score: f64,
    pub rank_key: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub k: usize,
    pub threshold: f64,
}

impl SearchOptions {
    #[must_use]
    pub fn new(k: usize, threshold: f64) -> Self {
        Self { k, threshold }
    }
}

/// A ranked result handed to the answer-generation collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub metadata: PassageMetadata,
    pub score: f64,
}

/// Final result set: ranked passages plus a confidence label derived from
/// their raw scores.
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub results: Vec<RetrievedPassage>,
    pub confidence: Confidence,
}

impl Retrieval {
    #[must_use]
    pub fn scores(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.score).collect()
    }
}
