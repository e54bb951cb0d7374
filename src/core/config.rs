use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL, DEFAULT_EMBEDDING_MODEL, DEFAULT_OLLAMA_URL};

/// Boost and penalty constants for the lexical channel.
///
/// The values mirror the tuned heuristics of the ranking pipeline; they are
/// carried as configuration so deployments can retune them without a code
/// change. `experience_phrases` is scanned against raw passage text when the
/// query intent is `experience`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalBoosts {
    /// Exact intent/category match.
    pub category_match: f64,
    /// Passage category or type is `experience` for an experience query.
    pub experience_category: f64,
    /// Same, and the passage text also contains an experience phrase.
    pub experience_category_phrase: f64,
    /// Experience phrase present but category does not match.
    pub experience_phrase_only: f64,
    /// Skills passages are confusable with work history; penalize them hard
    /// on experience queries.
    pub experience_skills_penalty: f64,
    /// Low-information keyword lookup passages rank below richer content.
    pub keyword_mapping_penalty: f64,
    /// Per-word multiplier step for overlap with a passage's question field.
    pub question_overlap_step: f64,
    /// intent=projects, type=project.
    pub project_type_boost: f64,
    /// intent=skills, type in {skills, soft_skills}.
    pub skills_type_boost: f64,
    /// intent=education, type=education.
    pub education_type_boost: f64,
    /// intent=contact, type=contact.
    pub contact_type_boost: f64,
    /// Query phrase that triggers the content-bonus scan.
    pub experience_query_phrase: String,
    /// Experience-indicating phrases scanned in passage text.
    pub experience_phrases: Vec<String>,
    /// Bonus when both query and passage contain the query phrase.
    pub direct_phrase_bonus: f64,
    /// Bonus when the passage contains any other experience phrase.
    pub phrase_match_bonus: f64,
    /// Bonus on top of the category+phrase boost.
    pub category_phrase_bonus: f64,
    /// Bonus when only the phrase matched, not the category.
    pub phrase_only_bonus: f64,
}

impl Default for LexicalBoosts {
    fn default() -> Self {
        Self {
            category_match: 3.0,
            experience_category: 3.5,
            experience_category_phrase: 6.0,
            experience_phrase_only: 5.0,
            experience_skills_penalty: 0.15,
            keyword_mapping_penalty: 0.7,
            question_overlap_step: 0.3,
            project_type_boost: 3.0,
            skills_type_boost: 2.0,
            education_type_boost: 3.0,
            contact_type_boost: 3.0,
            experience_query_phrase: "work experience".to_string(),
            experience_phrases: vec![
                "work experience".to_string(),
                "professional internship".to_string(),
                "three professional".to_string(),
                "internship".to_string(),
                "employment".to_string(),
            ],
            direct_phrase_bonus: 0.3,
            phrase_match_bonus: 0.2,
            category_phrase_bonus: 0.2,
            phrase_only_bonus: 0.15,
        }
    }
}

/// Static per-category multipliers for the weighted vector channel.
///
/// Multipliers shape the rank key only; reported scores stay unweighted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub weights: BTreeMap<String, f64>,
    pub default_weight: f64,
}

impl CategoryWeights {
    #[must_use]
    pub fn get(&self, category: &str) -> f64 {
        self.weights
            .get(category)
            .copied()
            .unwrap_or(self.default_weight)
    }

    /// No category shaping: every passage gets multiplier 1.0.
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            weights: BTreeMap::new(),
            default_weight: 1.0,
        }
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert("faq".to_string(), 1.2);
        weights.insert("about".to_string(), 1.1);
        weights.insert("skills".to_string(), 1.1);
        Self {
            weights,
            default_weight: 1.0,
        }
    }
}

/// Two-tier max/avg thresholds for confidence classification.
///
/// Lexical and vector scores live on different distributions, so each
/// channel carries its own pair set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub high_max: f64,
    pub high_avg: f64,
    pub medium_max: f64,
    pub medium_avg: f64,
}

impl ConfidenceThresholds {
    #[must_use]
    pub fn vector() -> Self {
        Self {
            high_max: 0.75,
            high_avg: 0.6,
            medium_max: 0.5,
            medium_avg: 0.4,
        }
    }

    #[must_use]
    pub fn lexical() -> Self {
        Self {
            high_max: 0.5,
            high_avg: 0.3,
            medium_max: 0.3,
            medium_avg: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub embedding_provider: String,
    pub embedding_model: String,
    /// Ollama endpoint.
    pub embedding_url: String,
    /// Override for OpenAI-compatible endpoints; `None` means the default.
    pub embedding_base_url: Option<String>,
    pub embedding_api_key: Option<String>,
    pub embedding_timeout_secs: u64,
    pub embedding_batch_size: usize,

    pub cache_size: usize,
    pub cache_ttl_secs: u64,

    pub default_k: usize,
    pub default_threshold: f64,
    pub context_capacity: usize,

    pub lexical: LexicalBoosts,
    pub category_weights: CategoryWeights,
    pub vector_confidence: ConfidenceThresholds,
    pub lexical_confidence: ConfidenceThresholds,
}

impl RagConfig {
    /// Read overrides from `PERSONA_RAG_*` environment variables on top of
    /// the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(provider) = std::env::var("PERSONA_RAG_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }
        if let Ok(model) = std::env::var("PERSONA_RAG_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }
        if let Ok(url) = std::env::var("PERSONA_RAG_EMBEDDING_URL") {
            config.embedding_url = url;
        }
        if let Ok(key) = std::env::var("PERSONA_RAG_EMBEDDING_API_KEY") {
            config.embedding_api_key = Some(key);
        }
        if let Ok(timeout) = std::env::var("PERSONA_RAG_EMBEDDING_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout.parse() {
                config.embedding_timeout_secs = timeout;
            }
        }
        if let Ok(batch_size) = std::env::var("PERSONA_RAG_EMBEDDING_BATCH_SIZE") {
            if let Ok(batch_size) = batch_size.parse() {
                config.embedding_batch_size = batch_size;
            }
        }
        if let Ok(size) = std::env::var("PERSONA_RAG_CACHE_SIZE") {
            if let Ok(size) = size.parse() {
                config.cache_size = size;
            }
        }
        if let Ok(ttl) = std::env::var("PERSONA_RAG_CACHE_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                config.cache_ttl_secs = ttl;
            }
        }
        if let Ok(k) = std::env::var("PERSONA_RAG_DEFAULT_K") {
            if let Ok(k) = k.parse() {
                config.default_k = k;
            }
        }
        if let Ok(threshold) = std::env::var("PERSONA_RAG_DEFAULT_THRESHOLD") {
            if let Ok(threshold) = threshold.parse() {
                config.default_threshold = threshold;
            }
        }
        if let Ok(capacity) = std::env::var("PERSONA_RAG_CONTEXT_CAPACITY") {
            if let Ok(capacity) = capacity.parse() {
                config.context_capacity = capacity;
            }
        }

        config
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding_provider: "openai".to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: DEFAULT_OLLAMA_URL.to_string(),
            embedding_base_url: None,
            embedding_api_key: None,
            embedding_timeout_secs: 30,
            embedding_batch_size: 100,

            cache_size: DEFAULT_CACHE_SIZE,
            cache_ttl_secs: DEFAULT_CACHE_TTL,

            default_k: 5,
            default_threshold: 0.3,
            context_capacity: 5,

            lexical: LexicalBoosts::default(),
            category_weights: CategoryWeights::default(),
            vector_confidence: ConfidenceThresholds::vector(),
            lexical_confidence: ConfidenceThresholds::lexical(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RagConfig::default();
        assert_eq!(config.default_k, 5);
        assert!((config.default_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.embedding_batch_size, 100);
    }

    #[test]
    fn test_category_weights_lookup() {
        let weights = CategoryWeights::default();
        assert!((weights.get("faq") - 1.2).abs() < f64::EPSILON);
        assert!((weights.get("about") - 1.1).abs() < f64::EPSILON);
        assert!((weights.get("projects") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_uniform_weights() {
        let weights = CategoryWeights::uniform();
        assert!((weights.get("faq") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_env_overrides() {
        unsafe {
            std::env::set_var("PERSONA_RAG_DEFAULT_K", "8");
            std::env::set_var("PERSONA_RAG_EMBEDDING_PROVIDER", "ollama");
        }
        let config = RagConfig::from_env();
        assert_eq!(config.default_k, 8);
        assert_eq!(config.embedding_provider, "ollama");
        unsafe {
            std::env::remove_var("PERSONA_RAG_DEFAULT_K");
            std::env::remove_var("PERSONA_RAG_EMBEDDING_PROVIDER");
        }
    }

    #[test]
    fn test_from_env_provider_tuning() {
        unsafe {
            std::env::set_var("PERSONA_RAG_EMBEDDING_TIMEOUT_SECS", "60");
            std::env::set_var("PERSONA_RAG_EMBEDDING_BATCH_SIZE", "25");
            std::env::set_var("PERSONA_RAG_CACHE_SIZE", "50");
            std::env::set_var("PERSONA_RAG_CACHE_TTL_SECS", "900");
        }
        let config = RagConfig::from_env();
        assert_eq!(config.embedding_timeout_secs, 60);
        assert_eq!(config.embedding_batch_size, 25);
        assert_eq!(config.cache_size, 50);
        assert_eq!(config.cache_ttl_secs, 900);
        unsafe {
            std::env::remove_var("PERSONA_RAG_EMBEDDING_TIMEOUT_SECS");
            std::env::remove_var("PERSONA_RAG_EMBEDDING_BATCH_SIZE");
            std::env::remove_var("PERSONA_RAG_CACHE_SIZE");
            std::env::remove_var("PERSONA_RAG_CACHE_TTL_SECS");
        }
    }
}
