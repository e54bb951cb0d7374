use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::info;

use super::{Derived, Index, Passage};
use crate::core::error::{RagError, Result};

pub const ARTIFACT_VERSION: u32 = 1;

/// On-disk form of an index: one versioned JSON blob holding the passage
/// list, the derived channel state, and the backend tag it was built with.
#[derive(Serialize, Deserialize)]
struct Artifact {
    version: u32,
    backend: String,
    saved_at: DateTime<Utc>,
    passages: Vec<Passage>,
    derived: Derived,
}

/// Write the index atomically: serialize into a temp file in the target
/// directory, then rename over the destination. A crash mid-save leaves any
/// previous artifact untouched.
pub fn save(index: &Index, path: &Path) -> Result<()> {
    let artifact = Artifact {
        version: ARTIFACT_VERSION,
        backend: index.backend().to_string(),
        saved_at: Utc::now(),
        passages: index.passages().to_vec(),
        derived: index.derived().clone(),
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut tmp, &artifact)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RagError::Io(e.error))?;

    info!(
        "Index saved: {} passages ({}) -> {}",
        index.len(),
        index.backend(),
        path.display()
    );
    Ok(())
}

/// Load and validate an artifact. The backend tag must match the active
/// channel exactly; version, lockstep lengths, and vector dimensionality are
/// checked before the index is handed back.
pub fn load(path: &Path, expected_backend: &str) -> Result<Index> {
    let raw = fs::read_to_string(path)?;
    let artifact: Artifact = serde_json::from_str(&raw)
        .map_err(|e| RagError::MalformedArtifact(e.to_string()))?;

    if artifact.version != ARTIFACT_VERSION {
        return Err(RagError::MalformedArtifact(format!(
            "unsupported artifact version {}",
            artifact.version
        )));
    }
    if artifact.backend != expected_backend {
        return Err(RagError::BackendMismatch {
            expected: expected_backend.to_string(),
            found: artifact.backend,
        });
    }

    let index = Index::from_parts(artifact.passages, artifact.derived, artifact.backend)?;
    info!(
        "Index loaded: {} passages ({}) <- {}",
        index.len(),
        index.backend(),
        path.display()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::keywords::extract_keywords;
    use crate::index::LEXICAL_BACKEND;

    fn lexical_index() -> Index {
        let mut index = Index::lexical();
        let batch = [
            ("I built a retrieval engine in Rust", "project", "projects"),
            ("Proficient in Python and PyTorch", "skills", "skills"),
        ]
        .into_iter()
        .map(|(content, kind, category)| {
            let passage = Passage::new(content, kind, category);
            let keywords = extract_keywords(&passage.content);
            (passage, keywords)
        })
        .collect();
        index.append_lexical(batch).unwrap();
        index
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let index = lexical_index();
        save(&index, &path).unwrap();
        let loaded = load(&path, LEXICAL_BACKEND).unwrap();

        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.keyword_sets().unwrap(), index.keyword_sets().unwrap());
        assert_eq!(loaded.passages()[0].content, index.passages()[0].content);
    }

    #[test]
    fn test_vector_roundtrip_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut index = Index::vector("test-model");
        index
            .append_vector(
                vec![(Passage::new("a", "faq", "faq"), vec![0.123_456_79_f32, -0.5])],
                None,
            )
            .unwrap();
        save(&index, &path).unwrap();

        let loaded = load(&path, "vector:test-model").unwrap();
        let (_, rows) = loaded.vectors().unwrap();
        let (_, original) = index.vectors().unwrap();
        assert_eq!(rows, original);
    }

    #[test]
    fn test_backend_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        save(&lexical_index(), &path).unwrap();

        let err = load(&path, "vector:test-model").unwrap_err();
        assert!(matches!(err, RagError::BackendMismatch { .. }));
    }

    #[test]
    fn test_truncated_artifact_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        save(&lexical_index(), &path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        fs::write(&path, &raw[..raw.len() / 2]).unwrap();

        let err = load(&path, LEXICAL_BACKEND).unwrap_err();
        assert!(matches!(err, RagError::MalformedArtifact(_)));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        save(&lexical_index(), &path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["version"] = serde_json::json!(99);
        fs::write(&path, value.to_string()).unwrap();

        let err = load(&path, LEXICAL_BACKEND).unwrap_err();
        assert!(matches!(err, RagError::MalformedArtifact(_)));
    }

    #[test]
    fn test_lockstep_violation_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        save(&lexical_index(), &path).unwrap();

        let mut value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        value["derived"]["sets"].as_array_mut().unwrap().pop();
        fs::write(&path, value.to_string()).unwrap();

        let err = load(&path, LEXICAL_BACKEND).unwrap_err();
        assert!(matches!(err, RagError::MalformedArtifact(_)));
    }
}
