use serde::{Deserialize, Serialize};
use strum::Display;

use crate::core::config::ConfidenceThresholds;

/// Coarse reliability label for a result set, derived from the distribution
/// of reported raw scores (never from rank keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Two-tier max/avg thresholding. An empty result list is `Low` by
/// definition, not a division fallthrough.
#[must_use]
pub fn classify(scores: &[f64], thresholds: &ConfidenceThresholds) -> Confidence {
    if scores.is_empty() {
        return Confidence::Low;
    }

    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg_score = scores.iter().sum::<f64>() / scores.len() as f64;

    if max_score > thresholds.high_max && avg_score > thresholds.high_avg {
        Confidence::High
    } else if max_score > thresholds.medium_max && avg_score > thresholds.medium_avg {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}
