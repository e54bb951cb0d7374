use serde::{Deserialize, Serialize};
use strum::Display;

/// Coarse topical classification of a query, used to bias ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize, Default)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum QueryIntent {
    Projects,
    Experience,
    Skills,
    Education,
    Contact,
    About,
    #[default]
    General,
}

impl QueryIntent {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Experience => "experience",
            Self::Skills => "skills",
            Self::Education => "education",
            Self::Contact => "contact",
            Self::About => "about",
            Self::General => "general",
        }
    }
}

/// Ordered rule table; evaluation is top-down and the first match wins.
/// Experience sits above skills on purpose: work-history queries often
/// mention technology names and must not land in the skills bucket.
const INTENT_RULES: &[(&[&str], QueryIntent)] = &[
    (
        &["project", "built", "developed", "created", "worked on"],
        QueryIntent::Projects,
    ),
    (
        &[
            "experience",
            "work history",
            "job",
            "internship",
            "company",
            "employment",
        ],
        QueryIntent::Experience,
    ),
    (
        &[
            "skill",
            "technology",
            "technologies",
            "proficient",
            "know",
            "framework",
            "language",
            "tools",
            "tech stack",
        ],
        QueryIntent::Skills,
    ),
    (
        &[
            "education",
            "school",
            "university",
            "degree",
            "study",
            "major",
            "graduate",
        ],
        QueryIntent::Education,
    ),
    (
        &["contact", "email", "phone", "reach", "linkedin", "github"],
        QueryIntent::Contact,
    ),
    (
        &[
            "who are you",
            "tell me about yourself",
            "introduce",
            "name",
            "location",
            "where are you",
        ],
        QueryIntent::About,
    ),
];

/// Classify a query by substring match against the rule table. No match
/// means `General` and no boosting downstream.
#[must_use]
pub fn classify(query: &str) -> QueryIntent {
    let query_lower = query.to_lowercase();
    for (keywords, intent) in INTENT_RULES {
        if keywords.iter().any(|kw| query_lower.contains(kw)) {
            return *intent;
        }
    }
    QueryIntent::General
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projects_intent() {
        assert_eq!(classify("Tell me about a project you built"), QueryIntent::Projects);
    }

    #[test]
    fn test_experience_beats_skills() {
        // Mentions a technology, but it is a work-history question.
        assert_eq!(
            classify("What was your experience with Python at your last job?"),
            QueryIntent::Experience
        );
    }

    #[test]
    fn test_skills_intent() {
        assert_eq!(
            classify("Which technologies are you proficient in?"),
            QueryIntent::Skills
        );
    }

    #[test]
    fn test_education_intent() {
        assert_eq!(classify("Where did you go to university?"), QueryIntent::Education);
    }

    #[test]
    fn test_contact_intent() {
        assert_eq!(classify("How can I reach you?"), QueryIntent::Contact);
    }

    #[test]
    fn test_about_intent() {
        assert_eq!(classify("Please introduce yourself"), QueryIntent::About);
    }

    #[test]
    fn test_general_fallback() {
        assert_eq!(classify("What is the weather like?"), QueryIntent::General);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("WORK HISTORY?"), QueryIntent::Experience);
    }

    #[test]
    fn test_display_lowercase() {
        assert_eq!(QueryIntent::Experience.to_string(), "experience");
        assert_eq!(QueryIntent::Experience.as_str(), "experience");
    }
}
