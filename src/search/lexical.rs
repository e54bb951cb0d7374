use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use super::intent::{self, QueryIntent};
use super::models::{ScoredCandidate, SearchOptions};
use crate::core::config::LexicalBoosts;
use crate::core::error::Result;
use crate::index::keywords::{extract_keywords, jaccard};
use crate::index::{Index, Passage};

/// Passage types whose `question` metadata participates in overlap boosting.
const QUESTION_BOOST_TYPES: &[&str] = &[
    "project",
    "experience",
    "skills",
    "education",
    "career_goals",
    "achievement",
    "personal_info",
];

/// Keyword-overlap scorer with intent-aware boosting.
///
/// The reported score is `min(2 * (jaccard + content_bonus) * boost, 1.0)`;
/// the uncapped boosted value is kept as the rank key.
pub struct LexicalChannel {
    boosts: LexicalBoosts,
}

impl LexicalChannel {
    #[must_use]
    pub fn new(boosts: LexicalBoosts) -> Self {
        Self { boosts }
    }

    pub fn rank(&self, index: &Index, query: &str, opts: SearchOptions) -> Result<Vec<ScoredCandidate>> {
        let keyword_sets = index.keyword_sets()?;
        if index.is_empty() {
            debug!("lexical: index is empty");
            return Ok(Vec::new());
        }

        let query_keywords = extract_keywords(query);
        let query_lower = query.to_lowercase();
        let query_intent = intent::classify(query);
        debug!("lexical: intent={} keywords={}", query_intent, query_keywords.len());

        let mut candidates: Vec<ScoredCandidate> = index
            .passages()
            .iter()
            .zip(keyword_sets)
            .enumerate()
            .map(|(passage_idx, (passage, keywords))| {
                let base = jaccard(&query_keywords, keywords);
                let (boost, content_bonus) =
                    self.boost_for(passage, query_intent, &query_lower, &query_keywords);
                let rank_key = (base + content_bonus) * boost;
                ScoredCandidate {
                    passage_idx,
                    score: (2.0 * rank_key).min(1.0),
                    rank_key,
                }
            })
            .collect();

        // Stable sort: ties keep passage insertion order.
        candidates.sort_by(|a, b| {
            b.rank_key
                .partial_cmp(&a.rank_key)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(opts.k);
        candidates.retain(|c| c.score >= opts.threshold);

        if candidates.is_empty() {
            debug!("lexical: no candidate cleared threshold {}", opts.threshold);
        }
        Ok(candidates)
    }

    /// Boost multiplier and additive content bonus for one passage.
    fn boost_for(
        &self,
        passage: &Passage,
        query_intent: QueryIntent,
        query_lower: &str,
        query_keywords: &BTreeSet<String>,
    ) -> (f64, f64) {
        let b = &self.boosts;
        let category = passage.metadata.category.as_str();
        let kind = passage.metadata.kind.as_str();

        let mut boost = 1.0;
        let mut content_bonus = 0.0;

        if query_intent == QueryIntent::Experience {
            let content_lower = passage.content.to_lowercase();
            let has_phrase = b
                .experience_phrases
                .iter()
                .any(|phrase| content_lower.contains(phrase.as_str()));

            if query_lower.contains(&b.experience_query_phrase) {
                if content_lower.contains(&b.experience_query_phrase) {
                    content_bonus += b.direct_phrase_bonus;
                }
                if b.experience_phrases
                    .iter()
                    .filter(|p| **p != b.experience_query_phrase)
                    .any(|p| content_lower.contains(p.as_str()))
                {
                    content_bonus += b.phrase_match_bonus;
                }
            }

            if category == "experience" || kind == "experience" {
                boost = b.experience_category;
                if has_phrase {
                    boost = b.experience_category_phrase;
                    content_bonus += b.category_phrase_bonus;
                }
            } else if has_phrase {
                boost = b.experience_phrase_only;
                content_bonus += b.phrase_only_bonus;
            } else if category == "skills" {
                boost = b.experience_skills_penalty;
            }
        } else if query_intent != QueryIntent::General && query_intent.as_str() == category {
            boost = b.category_match;
        } else if query_intent == QueryIntent::Projects && kind == "project" {
            boost = b.project_type_boost;
        } else if query_intent == QueryIntent::Skills && (kind == "skills" || kind == "soft_skills") {
            boost = b.skills_type_boost;
        } else if query_intent == QueryIntent::Education && kind == "education" {
            boost = b.education_type_boost;
        } else if query_intent == QueryIntent::Contact && kind == "contact" {
            boost = b.contact_type_boost;
        }

        // Quick keyword lookups lose to richer passages on equal overlap.
        if kind == "keyword_mapping" {
            boost *= b.keyword_mapping_penalty;
        }

        if QUESTION_BOOST_TYPES.contains(&kind) {
            if let Some(question) = &passage.metadata.question {
                let question_keywords = extract_keywords(question);
                let overlap = query_keywords.intersection(&question_keywords).count();
                if overlap > 0 {
                    boost *= 1.0 + overlap as f64 * b.question_overlap_step;
                }
            }
        }

        (boost, content_bonus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Passage;

    fn build_index(passages: Vec<Passage>) -> Index {
        let mut index = Index::lexical();
        let batch = passages
            .into_iter()
            .map(|p| {
                let keywords = extract_keywords(&p.content);
                (p, keywords)
            })
            .collect();
        index.append_lexical(batch).unwrap();
        index
    }

    fn channel() -> LexicalChannel {
        LexicalChannel::new(LexicalBoosts::default())
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = Index::lexical();
        let results = channel()
            .rank(&index, "anything", SearchOptions::new(5, 0.0))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_disjoint_keywords_score_zero() {
        let index = build_index(vec![Passage::new(
            "gardening tomatoes sunlight",
            "faq",
            "faq",
        )]);
        let results = channel()
            .rank(&index, "rust compiler internals", SearchOptions::new(5, 0.0))
            .unwrap();
        assert_eq!(results[0].score, 0.0);
    }

    #[test]
    fn test_experience_passage_outranks_skills_on_experience_query() {
        // Raw keyword overlap can favor the skills passage; the boost path
        // must still put work history first.
        let index = build_index(vec![
            Passage::new(
                "I completed three professional internships across two companies",
                "experience",
                "experience",
            ),
            Passage::new("Python, PyTorch, experience with tell work", "skills", "skills"),
        ]);
        let results = channel()
            .rank(
                &index,
                "tell me about your work experience",
                SearchOptions::new(5, 0.0),
            )
            .unwrap();
        assert_eq!(results[0].passage_idx, 0);
        assert!(results[0].rank_key > results[1].rank_key);
    }

    #[test]
    fn test_never_more_than_k() {
        let passages = (0..10)
            .map(|i| Passage::new(format!("rust engine passage number {i}"), "faq", "faq"))
            .collect();
        let index = build_index(passages);
        let results = channel()
            .rank(&index, "rust engine", SearchOptions::new(3, 0.0))
            .unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_threshold_drops_results() {
        let index = build_index(vec![Passage::new("completely unrelated text", "faq", "faq")]);
        let results = channel()
            .rank(&index, "rust tokio channels", SearchOptions::new(5, 0.2))
            .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_reported_score_capped_at_one() {
        let index = build_index(vec![Passage::new(
            "three professional internships work experience employment",
            "experience",
            "experience",
        )]);
        let results = channel()
            .rank(
                &index,
                "tell me about your work experience",
                SearchOptions::new(5, 0.0),
            )
            .unwrap();
        assert!(results[0].score <= 1.0);
        assert!(results[0].rank_key > results[0].score);
    }

    #[test]
    fn test_keyword_mapping_penalized() {
        let index = build_index(vec![
            Passage::new("rust tokio async runtime details", "keyword_mapping", "faq"),
            Passage::new("rust tokio async runtime details", "faq", "faq"),
        ]);
        let results = channel()
            .rank(&index, "rust tokio async", SearchOptions::new(5, 0.0))
            .unwrap();
        // Same overlap, but the keyword mapping passage ranks second.
        assert_eq!(results[0].passage_idx, 1);
    }

    #[test]
    fn test_question_overlap_multiplies_boost() {
        let with_question = Passage::new("details about the search engine", "project", "projects")
            .with_question("how did you build your rust search engine?");
        let without_question = Passage::new("details about the search engine", "project", "projects");
        let index = build_index(vec![without_question, with_question]);

        let results = channel()
            .rank(&index, "your rust search engine", SearchOptions::new(5, 0.0))
            .unwrap();
        assert_eq!(results[0].passage_idx, 1);
    }

    #[test]
    fn test_stable_tie_order() {
        let index = build_index(vec![
            Passage::new("identical text body", "faq", "faq"),
            Passage::new("identical text body", "faq", "faq"),
        ]);
        let results = channel()
            .rank(&index, "identical text", SearchOptions::new(5, 0.0))
            .unwrap();
        assert_eq!(results[0].passage_idx, 0);
        assert_eq!(results[1].passage_idx, 1);
    }
}
