pub mod keywords;
pub mod persist;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::core::error::{RagError, Result};

pub const LEXICAL_BACKEND: &str = "lexical:keyword-overlap";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassageMetadata {
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, String>,
}

/// An immutable unit of retrievable content. Created once during ingestion,
/// never mutated; replaced only by a full index rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub content: String,
    pub metadata: PassageMetadata,
}

impl Passage {
    pub fn new(content: impl Into<String>, kind: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: PassageMetadata {
                kind: kind.into(),
                category: category.into(),
                question: None,
                extra: HashMap::new(),
            },
        }
    }

    #[must_use]
    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.metadata.question = Some(question.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryVectors {
    pub dim: usize,
    pub rows: Vec<Vec<f32>>,
}

/// Channel-specific state derived from the passage list, aligned by
/// position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derived {
    Keywords {
        sets: Vec<BTreeSet<String>>,
    },
    Vectors {
        dim: usize,
        rows: Vec<Vec<f32>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secondary: Option<SecondaryVectors>,
    },
}

impl Derived {
    fn len(&self) -> usize {
        match self {
            Derived::Keywords { sets } => sets.len(),
            Derived::Vectors { rows, .. } => rows.len(),
        }
    }
}

/// Passage store plus derived channel state.
///
/// Invariant: derived state has exactly one entry per passage; appends
/// extend both in lockstep or fail without mutating anything.
#[derive(Debug, Clone)]
pub struct Index {
    passages: Vec<Passage>,
    derived: Derived,
    backend: String,
}

impl Index {
    #[must_use]
    pub fn lexical() -> Self {
        Self {
            passages: Vec::new(),
            derived: Derived::Keywords { sets: Vec::new() },
            backend: LEXICAL_BACKEND.to_string(),
        }
    }

    #[must_use]
    pub fn vector(model: &str) -> Self {
        Self {
            passages: Vec::new(),
            derived: Derived::Vectors {
                dim: 0,
                rows: Vec::new(),
                secondary: None,
            },
            backend: format!("vector:{model}"),
        }
    }

    pub(crate) fn from_parts(passages: Vec<Passage>, derived: Derived, backend: String) -> Result<Self> {
        let index = Self {
            passages,
            derived,
            backend,
        };
        index.validate()?;
        Ok(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    #[must_use]
    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub(crate) fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn keyword_sets(&self) -> Result<&[BTreeSet<String>]> {
        match &self.derived {
            Derived::Keywords { sets } => Ok(sets),
            Derived::Vectors { .. } => Err(RagError::BackendMismatch {
                expected: LEXICAL_BACKEND.to_string(),
                found: self.backend.clone(),
            }),
        }
    }

    /// Text-embedding matrix as `(dim, rows)`; `dim` is 0 until the first
    /// append.
    pub fn vectors(&self) -> Result<(usize, &[Vec<f32>])> {
        match &self.derived {
            Derived::Vectors { dim, rows, .. } => Ok((*dim, rows)),
            Derived::Keywords { .. } => Err(RagError::BackendMismatch {
                expected: "vector:*".to_string(),
                found: self.backend.clone(),
            }),
        }
    }

    #[must_use]
    pub fn secondary_vectors(&self) -> Option<&SecondaryVectors> {
        match &self.derived {
            Derived::Vectors { secondary, .. } => secondary.as_ref(),
            Derived::Keywords { .. } => None,
        }
    }

    pub fn append_lexical(&mut self, batch: Vec<(Passage, BTreeSet<String>)>) -> Result<()> {
        let Derived::Keywords { sets } = &mut self.derived else {
            return Err(RagError::BackendMismatch {
                expected: LEXICAL_BACKEND.to_string(),
                found: self.backend.clone(),
            });
        };

        self.passages.reserve(batch.len());
        sets.reserve(batch.len());
        for (passage, keywords) in batch {
            self.passages.push(passage);
            sets.push(keywords);
        }
        Ok(())
    }

    /// Append passages with their text vectors and, optionally, aligned
    /// secondary-modality vectors. The whole batch is validated before any
    /// mutation so readers never see a partially extended index.
    pub fn append_vector(
        &mut self,
        batch: Vec<(Passage, Vec<f32>)>,
        secondary: Option<Vec<Vec<f32>>>,
    ) -> Result<()> {
        let backend = self.backend.clone();
        let Derived::Vectors {
            dim,
            rows,
            secondary: secondary_state,
        } = &mut self.derived
        else {
            return Err(RagError::BackendMismatch {
                expected: "vector:*".to_string(),
                found: backend,
            });
        };

        if batch.is_empty() {
            return Ok(());
        }

        let batch_dim = batch[0].1.len();
        if batch_dim == 0 {
            return Err(RagError::MalformedArtifact(
                "zero-dimension embedding in batch".to_string(),
            ));
        }
        if *dim != 0 && batch_dim != *dim {
            return Err(RagError::BackendMismatch {
                expected: format!("{backend} (dim {dim})"),
                found: format!("{backend} (dim {batch_dim})"),
            });
        }
        if batch.iter().any(|(_, v)| v.len() != batch_dim) {
            return Err(RagError::MalformedArtifact(
                "ragged embedding batch".to_string(),
            ));
        }

        match (&secondary, &secondary_state) {
            (Some(vecs), _) if vecs.len() != batch.len() => {
                return Err(RagError::MalformedArtifact(format!(
                    "secondary vectors ({}) do not match batch size ({})",
                    vecs.len(),
                    batch.len()
                )));
            }
            // Once the index carries a secondary matrix, every later append
            // must extend it too.
            (None, Some(_)) => {
                return Err(RagError::MalformedArtifact(
                    "index has secondary vectors but batch provides none".to_string(),
                ));
            }
            // The mirror case: a secondary matrix can only start on the
            // first batch, or earlier passages would have no rows in it.
            (Some(_), None) if !self.passages.is_empty() => {
                return Err(RagError::MalformedArtifact(
                    "batch provides secondary vectors but existing passages have none".to_string(),
                ));
            }
            _ => {}
        }

        if let Some(vecs) = &secondary {
            let sec_dim = secondary_state
                .as_ref()
                .map(|s| s.dim)
                .or_else(|| vecs.first().map(Vec::len))
                .unwrap_or(0);
            if sec_dim == 0 || vecs.iter().any(|v| v.len() != sec_dim) {
                return Err(RagError::MalformedArtifact(
                    "ragged secondary vector batch".to_string(),
                ));
            }
        }

        *dim = batch_dim;
        self.passages.reserve(batch.len());
        rows.reserve(batch.len());
        for (passage, vector) in batch {
            self.passages.push(passage);
            rows.push(vector);
        }
        if let Some(vecs) = secondary {
            let sec_dim = vecs[0].len();
            let state = secondary_state.get_or_insert_with(|| SecondaryVectors {
                dim: sec_dim,
                rows: Vec::new(),
            });
            state.rows.extend(vecs);
        }

        Ok(())
    }

    /// Document count per category.
    #[must_use]
    pub fn category_stats(&self) -> BTreeMap<String, usize> {
        let mut stats = BTreeMap::new();
        for passage in &self.passages {
            *stats.entry(passage.metadata.category.clone()).or_insert(0) += 1;
        }
        stats
    }

    fn validate(&self) -> Result<()> {
        if self.derived.len() != self.passages.len() {
            return Err(RagError::MalformedArtifact(format!(
                "derived state has {} entries for {} passages",
                self.derived.len(),
                self.passages.len()
            )));
        }
        if let Derived::Vectors { dim, rows, secondary } = &self.derived {
            if rows.iter().any(|r| r.len() != *dim) {
                return Err(RagError::MalformedArtifact(
                    "embedding rows disagree with declared dimension".to_string(),
                ));
            }
            if let Some(sec) = secondary {
                if sec.rows.len() != self.passages.len() {
                    return Err(RagError::MalformedArtifact(format!(
                        "secondary state has {} entries for {} passages",
                        sec.rows.len(),
                        self.passages.len()
                    )));
                }
                if sec.rows.iter().any(|r| r.len() != sec.dim) {
                    return Err(RagError::MalformedArtifact(
                        "secondary rows disagree with declared dimension".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
