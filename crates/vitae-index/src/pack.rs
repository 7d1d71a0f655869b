//! The persisted index: vocabulary, idf table and weighted chunks.
//!
//! A pack is written once by the builder and only ever read afterwards.
//! The JSON layout is the sole contract between the two halves, gated by
//! [`SCHEMA_VERSION`].

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vitae_core::{Section, TokenizerConfig, VitaeError};

use crate::sparse::SparseVector;
use crate::tokenizer::Tokenizer;
use crate::vectorizer::{Vectorized, Vocabulary};

/// Pack layout version written by this build and the only one it loads.
pub const SCHEMA_VERSION: u32 = 1;

/// Relative tolerance when checking stored norms against their vectors.
const NORM_TOLERANCE: f64 = 1e-6;

/// One retrievable passage with its precomputed TF-IDF vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position in document order; also the tie-breaker when ranking.
    pub id: usize,
    /// Display text.
    pub text: String,
    /// Section label, when the passage sat under a known heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
    /// Non-zero TF-IDF weights.
    pub vector: SparseVector,
    /// Euclidean norm of `vector`.
    pub norm: f64,
}

/// A complete, versioned retrieval index.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeConfig;
/// use vitae_index::pack::Pack;
///
/// let pack = vitae_index::build_pack("", &VitaeConfig::default());
/// assert!(pack.is_empty());
///
/// let json = pack.to_json().unwrap();
/// let loaded = Pack::from_json(&json).unwrap();
/// assert_eq!(loaded, pack);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    /// Layout version, see [`SCHEMA_VERSION`].
    pub schema_version: u32,
    /// Name of the source document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// When the pack was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// SHA-256 over the indexed passages, for spotting stale packs.
    pub content_sha256: String,
    /// Tokenizer settings the vectors were built with.
    pub tokenizer: TokenizerConfig,
    /// Terms in index order.
    pub vocab: Vec<String>,
    /// Idf per vocabulary index.
    pub idf: Vec<f64>,
    /// Chunks in document order.
    pub chunks: Vec<Chunk>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaProbe {
    schema_version: Option<u32>,
}

impl Pack {
    /// Assemble a pack from vectorizer output.
    pub fn new(tokenizer: TokenizerConfig, vectorized: Vectorized) -> Self {
        let content_sha256 = content_hash(&vectorized.chunks);
        Self {
            schema_version: SCHEMA_VERSION,
            source: None,
            created: None,
            content_sha256,
            tokenizer,
            vocab: vectorized.vocabulary.into_terms(),
            idf: vectorized.idf,
            chunks: vectorized.chunks,
        }
    }

    /// Whether the pack holds no chunks and can answer nothing.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Tokenizer matching the one the pack was built with.
    pub fn tokenizer(&self) -> Tokenizer {
        Tokenizer::new(&self.tokenizer)
    }

    /// Vocabulary lookup table.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::MalformedPack`] on duplicate terms.
    pub fn vocabulary(&self) -> Result<Vocabulary, VitaeError> {
        Vocabulary::from_terms(self.vocab.clone())
            .map_err(|term| VitaeError::MalformedPack(format!("duplicate vocabulary term {term:?}")))
    }

    /// Serialize to pretty JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Serialization`] if encoding fails.
    pub fn to_json(&self) -> Result<String, VitaeError> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    /// Parse and validate a pack.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::IncompatibleSchema`] for another schema version
    /// and [`VitaeError::MalformedPack`] for anything structurally wrong.
    pub fn from_json(json: &str) -> Result<Self, VitaeError> {
        let probe: SchemaProbe = serde_json::from_str(json)
            .map_err(|e| VitaeError::MalformedPack(format!("not a pack document: {e}")))?;
        match probe.schema_version {
            None => {
                return Err(VitaeError::MalformedPack(
                    "missing required field `schemaVersion`".into(),
                ))
            }
            Some(found) if found != SCHEMA_VERSION => {
                return Err(VitaeError::IncompatibleSchema {
                    found,
                    expected: SCHEMA_VERSION,
                })
            }
            Some(_) => {}
        }

        let pack: Pack =
            serde_json::from_str(json).map_err(|e| VitaeError::MalformedPack(e.to_string()))?;
        pack.validate()?;
        Ok(pack)
    }

    /// Check every structural invariant the query engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::MalformedPack`] naming the first violation.
    pub fn validate(&self) -> Result<(), VitaeError> {
        let malformed = |msg: String| Err(VitaeError::MalformedPack(msg));

        if self.schema_version != SCHEMA_VERSION {
            return Err(VitaeError::IncompatibleSchema {
                found: self.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        if self.idf.len() != self.vocab.len() {
            return malformed(format!(
                "idf table has {} entries for {} vocabulary terms",
                self.idf.len(),
                self.vocab.len()
            ));
        }
        let mut seen = HashSet::with_capacity(self.vocab.len());
        for term in &self.vocab {
            if !seen.insert(term.as_str()) {
                return malformed(format!("duplicate vocabulary term {term:?}"));
            }
        }
        if let Some((i, idf)) = self
            .idf
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return malformed(format!("idf for term {i} is invalid ({idf})"));
        }

        for (position, chunk) in self.chunks.iter().enumerate() {
            if chunk.id != position {
                return malformed(format!(
                    "chunk at position {position} has id {}",
                    chunk.id
                ));
            }
            if chunk.text.trim().is_empty() {
                return malformed(format!("chunk {position} has empty text"));
            }
            let mut previous: Option<u32> = None;
            for &(index, weight) in chunk.vector.entries() {
                if index as usize >= self.vocab.len() {
                    return malformed(format!(
                        "chunk {position} references term {index} outside a vocabulary of {}",
                        self.vocab.len()
                    ));
                }
                if previous.is_some_and(|p| p >= index) {
                    return malformed(format!(
                        "chunk {position} vector is not strictly ordered at term {index}"
                    ));
                }
                if !weight.is_finite() || weight <= 0.0 {
                    return malformed(format!(
                        "chunk {position} has invalid weight {weight} for term {index}"
                    ));
                }
                previous = Some(index);
            }
            if !chunk.norm.is_finite() || chunk.norm < 0.0 {
                return malformed(format!("chunk {position} has invalid norm {}", chunk.norm));
            }
            let recomputed = chunk.vector.norm();
            if (recomputed - chunk.norm).abs() > NORM_TOLERANCE * recomputed.max(1.0) {
                return malformed(format!(
                    "chunk {position} norm {} does not match its vector ({recomputed})",
                    chunk.norm
                ));
            }
        }

        Ok(())
    }

    /// Write the pack to `path` atomically.
    ///
    /// The JSON goes to a temporary file in the destination directory which
    /// is then renamed over `path`; on failure `path` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Io`] if the directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), VitaeError> {
        let json = self.to_json()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| VitaeError::Io(e.error))?;

        tracing::info!(
            path = %path.display(),
            chunks = self.chunks.len(),
            vocabulary = self.vocab.len(),
            "wrote pack"
        );
        Ok(())
    }

    /// Read and validate a pack from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::FileNotFound`] if `path` does not exist, plus
    /// everything [`Pack::from_json`] returns.
    pub fn load(path: &Path) -> Result<Self, VitaeError> {
        if !path.exists() {
            return Err(VitaeError::FileNotFound(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

fn content_hash(chunks: &[Chunk]) -> String {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        if let Some(section) = &chunk.section {
            hasher.update(section.as_str().as_bytes());
        }
        hasher.update([0u8]);
        hasher.update(chunk.text.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::Passage;
    use vitae_core::VitaeConfig;

    #[test]
    fn floats_parse_back_to_the_same_bits() {
        for x in [1.8754687373539_f64, 9.960996535799357, 0.1 + 0.2, 1.0 / 3.0] {
            let json = serde_json::to_string(&x).unwrap();
            let back: f64 = serde_json::from_str(&json).unwrap();
            assert_eq!(back.to_bits(), x.to_bits(), "{json}");
        }
    }

    fn sample() -> Pack {
        crate::pack_passages(
            &[
                Passage {
                    text: "Worked on distributed systems at Acme".into(),
                    section: Some(Section::new("experience")),
                },
                Passage {
                    text: "Studied computer science at State University".into(),
                    section: Some(Section::new("education")),
                },
            ],
            &VitaeConfig::default(),
        )
    }

    fn reject(json: &str) -> VitaeError {
        Pack::from_json(json).unwrap_err()
    }

    #[test]
    fn json_round_trip_is_exact() {
        let pack = sample();
        let json = pack.to_json().unwrap();
        let loaded = Pack::from_json(&json).unwrap();
        assert_eq!(loaded, pack);
        assert_eq!(loaded.to_json().unwrap(), json);
    }

    #[test]
    fn metadata_round_trips() {
        let mut pack = sample();
        pack.source = Some("resume.txt".into());
        pack.created = Some(Utc::now());
        let loaded = Pack::from_json(&pack.to_json().unwrap()).unwrap();
        assert_eq!(loaded.source, pack.source);
        assert_eq!(loaded.created, pack.created);
    }

    #[test]
    fn layout_uses_documented_keys() {
        let value: serde_json::Value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert!(value["vocab"].is_array());
        assert!(value["idf"].is_array());
        assert_eq!(value["chunks"][0]["id"], 0);
        assert_eq!(value["chunks"][0]["section"], "experience");
        assert!(value["chunks"][0]["vector"][0].is_array());
        assert!(value["chunks"][0]["norm"].is_f64());
        assert!(value.get("created").is_none());
    }

    #[test]
    fn wrong_schema_version_is_incompatible() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["schemaVersion"] = 2.into();
        match reject(&value.to_string()) {
            VitaeError::IncompatibleSchema { found, expected } => {
                assert_eq!(found, 2);
                assert_eq!(expected, SCHEMA_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_version_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("schemaVersion");
        assert!(matches!(
            reject(&value.to_string()),
            VitaeError::MalformedPack(_)
        ));
    }

    #[test]
    fn missing_field_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value.as_object_mut().unwrap().remove("idf");
        let err = reject(&value.to_string());
        assert!(matches!(err, VitaeError::MalformedPack(_)));
        assert!(err.to_string().contains("idf"));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(reject("not json"), VitaeError::MalformedPack(_)));
        assert!(matches!(reject("[1, 2]"), VitaeError::MalformedPack(_)));
    }

    #[test]
    fn out_of_range_term_index_is_malformed() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["chunks"][0]["vector"][0][0] = 999.into();
        let err = reject(&value.to_string());
        assert!(err.to_string().contains("999"), "{err}");
    }

    #[test]
    fn short_idf_table_is_malformed() {
        let mut pack = sample();
        pack.idf.pop();
        assert!(matches!(pack.validate(), Err(VitaeError::MalformedPack(_))));
    }

    #[test]
    fn duplicate_vocabulary_is_malformed() {
        let mut pack = sample();
        let first = pack.vocab[0].clone();
        pack.vocab[1] = first;
        assert!(pack.validate().is_err());
        assert!(pack.vocabulary().is_err());
    }

    #[test]
    fn tampered_norm_is_malformed() {
        let mut pack = sample();
        pack.chunks[0].norm += 1.0;
        let err = pack.validate().unwrap_err();
        assert!(err.to_string().contains("norm"));
    }

    #[test]
    fn shuffled_ids_are_malformed() {
        let mut pack = sample();
        pack.chunks.swap(0, 1);
        assert!(pack.validate().is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/pack.json");
        let pack = sample();
        pack.save(&path).unwrap();
        let loaded = Pack::load(&path).unwrap();
        assert_eq!(loaded, pack);
        // only the pack itself is left behind
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn load_missing_file() {
        let err = Pack::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, VitaeError::FileNotFound(_)));
    }

    #[test]
    fn content_hash_tracks_text() {
        let a = sample();
        let b = crate::pack_passages(
            &[Passage {
                text: "Something else entirely".into(),
                section: None,
            }],
            &VitaeConfig::default(),
        );
        assert_eq!(a.content_sha256.len(), 64);
        assert_ne!(a.content_sha256, b.content_sha256);
        assert_eq!(a.content_sha256, sample().content_sha256);
    }
}
