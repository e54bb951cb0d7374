use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use super::models::ScoredCandidate;

/// Combine two channels' candidate lists into one ranked list.
///
/// `combined = weight * score_a + (1 - weight) * score_b`, with a passage
/// absent from one channel contributing 0 from that channel. `weight = 1`
/// degenerates to channel A only, `weight = 0` to channel B only. Ties keep
/// first-seen order (channel A first).
#[must_use]
pub fn fuse_weighted(
    channel_a: &[ScoredCandidate],
    channel_b: &[ScoredCandidate],
    k: usize,
    weight: f64,
) -> Vec<ScoredCandidate> {
    let weight = weight.clamp(0.0, 1.0);

    let mut order: Vec<usize> = Vec::with_capacity(channel_a.len() + channel_b.len());
    let mut combined: HashMap<usize, f64> = HashMap::new();

    for candidate in channel_a {
        combined
            .entry(candidate.passage_idx)
            .and_modify(|s| *s += weight * candidate.score)
            .or_insert_with(|| {
                order.push(candidate.passage_idx);
                weight * candidate.score
            });
    }
    for candidate in channel_b {
        combined
            .entry(candidate.passage_idx)
            .and_modify(|s| *s += (1.0 - weight) * candidate.score)
            .or_insert_with(|| {
                order.push(candidate.passage_idx);
                (1.0 - weight) * candidate.score
            });
    }

    let mut fused: Vec<ScoredCandidate> = order
        .into_iter()
        .map(|passage_idx| {
            let score = combined[&passage_idx];
            ScoredCandidate {
                passage_idx,
                score,
                rank_key: score,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.rank_key
            .partial_cmp(&a.rank_key)
            .unwrap_or(Ordering::Equal)
    });
    fused.truncate(k);

    debug!(
        "fusion: {} + {} candidates -> {} (weight={})",
        channel_a.len(),
        channel_b.len(),
        fused.len(),
        weight
    );
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(passage_idx: usize, score: f64) -> ScoredCandidate {
        ScoredCandidate {
            passage_idx,
            score,
            rank_key: score,
        }
    }

    #[test]
    fn test_missing_channel_contributes_zero() {
        // A: {1: 0.8}; B: {1: 0.2, 2: 0.9}; weight 0.5
        let a = vec![candidate(1, 0.8)];
        let b = vec![candidate(1, 0.2), candidate(2, 0.9)];
        let fused = fuse_weighted(&a, &b, 5, 0.5);

        assert_eq!(fused[0].passage_idx, 1);
        assert!((fused[0].score - 0.5).abs() < 1e-12);
        assert_eq!(fused[1].passage_idx, 2);
        assert!((fused[1].score - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_weight_one_is_channel_a_only() {
        let a = vec![candidate(0, 0.4)];
        let b = vec![candidate(1, 0.9)];
        let fused = fuse_weighted(&a, &b, 5, 1.0);
        assert_eq!(fused[0].passage_idx, 0);
        assert!((fused[0].score - 0.4).abs() < 1e-12);
        assert_eq!(fused[1].score, 0.0);
    }

    #[test]
    fn test_weight_zero_is_channel_b_only() {
        let a = vec![candidate(0, 0.9)];
        let b = vec![candidate(1, 0.4)];
        let fused = fuse_weighted(&a, &b, 5, 0.0);
        assert_eq!(fused[0].passage_idx, 1);
    }

    #[test]
    fn test_weight_clamped() {
        let a = vec![candidate(0, 0.5)];
        let fused = fuse_weighted(&a, &[], 5, 3.0);
        assert!((fused[0].score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_truncates_to_k() {
        let a: Vec<_> = (0..10).map(|i| candidate(i, 0.5)).collect();
        assert_eq!(fuse_weighted(&a, &[], 3, 0.5).len(), 3);
    }

    #[test]
    fn test_tie_keeps_first_seen_order() {
        let a = vec![candidate(5, 0.5)];
        let b = vec![candidate(7, 0.5)];
        let fused = fuse_weighted(&a, &b, 5, 0.5);
        assert_eq!(fused[0].passage_idx, 5);
        assert_eq!(fused[1].passage_idx, 7);
    }

    #[test]
    fn test_increasing_weight_never_demotes_a_only_passage() {
        // Passage 0 scores only in channel A; raising the weight toward 1
        // must not lower its rank.
        let a = vec![candidate(0, 0.6)];
        let b = vec![candidate(1, 0.8), candidate(2, 0.3)];

        let rank_of = |weight: f64| {
            fuse_weighted(&a, &b, 5, weight)
                .iter()
                .position(|c| c.passage_idx == 0)
                .unwrap()
        };

        let mut previous = rank_of(0.0);
        for weight in [0.25, 0.5, 0.75, 1.0] {
            let rank = rank_of(weight);
            assert!(rank <= previous);
            previous = rank;
        }
    }
}
