//! Cosine-similarity ranking and extractive answer assembly.
//!
//! Every query is a pure function of the question and an immutable pack:
//! nothing is cached between calls and the pack is never modified.

use std::collections::HashMap;

use serde::Serialize;
use vitae_core::{QueryConfig, Section, VitaeError};
use vitae_index::pack::{Chunk, Pack};
use vitae_index::sparse::SparseVector;
use vitae_index::tokenizer::Tokenizer;
use vitae_index::vectorizer::Vocabulary;

/// A validated pack together with the lookup structures queries need.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeConfig;
/// use vitae_query::LoadedPack;
///
/// let pack = vitae_index::build_pack("", &VitaeConfig::default());
/// let loaded = LoadedPack::new(pack).unwrap();
/// assert!(loaded.pack().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pack: Pack,
    vocabulary: Vocabulary,
    tokenizer: Tokenizer,
}

impl LoadedPack {
    /// Validate `pack` and prepare it for querying.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::MalformedPack`] or
    /// [`VitaeError::IncompatibleSchema`] if the pack fails validation.
    pub fn new(pack: Pack) -> Result<Self, VitaeError> {
        pack.validate()?;
        let vocabulary = pack.vocabulary()?;
        let tokenizer = pack.tokenizer();
        Ok(Self {
            pack,
            vocabulary,
            tokenizer,
        })
    }

    /// Parse, validate and prepare a pack from its JSON form.
    ///
    /// # Errors
    ///
    /// See [`Pack::from_json`].
    pub fn from_json(json: &str) -> Result<Self, VitaeError> {
        Self::new(Pack::from_json(json)?)
    }

    /// The underlying pack.
    pub fn pack(&self) -> &Pack {
        &self.pack
    }
}

/// Ranking and selection knobs for [`answer`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    /// Maximum number of passages in the answer.
    pub top_k: usize,
    /// Passages must score strictly above this.
    pub min_score: f64,
    /// Skip passages at least this similar to one already selected.
    pub dedup_threshold: Option<f64>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

impl From<&QueryConfig> for QueryOptions {
    fn from(config: &QueryConfig) -> Self {
        Self {
            top_k: config.top_k,
            min_score: config.min_score,
            dedup_threshold: config.dedup_threshold.filter(|_| config.dedup),
        }
    }
}

/// Score of one chunk for one question.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scored {
    /// Chunk id.
    pub chunk_id: usize,
    /// Cosine similarity in `[0, 1]`.
    pub score: f64,
}

/// A passage selected for the answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Chunk id.
    pub chunk_id: usize,
    /// Cosine similarity with the question.
    pub score: f64,
    /// Display text of the passage.
    pub text: String,
    /// Section the passage belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<Section>,
}

/// Ranked matches and their concatenated text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    /// Selected passages, best first.
    pub matches: Vec<Match>,
    /// Passage texts in ranked order, separated by blank lines.
    pub assembled: String,
}

/// Why a question produced no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoMatchReason {
    /// The pack has no chunks.
    EmptyPack,
    /// None of the question's terms are in the vocabulary.
    NoKnownTerms,
    /// No chunk scored above the relevance threshold.
    BelowThreshold,
}

/// Result of asking a question.
///
/// # Examples
///
/// ```
/// use vitae_query::{NoMatchReason, Outcome};
///
/// let outcome = Outcome::NoMatch { reason: NoMatchReason::NoKnownTerms };
/// assert!(outcome.answer().is_none());
/// let json = serde_json::to_string(&outcome).unwrap();
/// assert_eq!(json, r#"{"status":"noMatch","reason":"noKnownTerms"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Outcome {
    /// At least one passage cleared the threshold.
    Answered(Answer),
    /// A legitimate empty result.
    NoMatch {
        /// What ruled every passage out.
        reason: NoMatchReason,
    },
    /// No pack has been loaded yet.
    NotReady,
}

impl Outcome {
    /// The answer, if there is one.
    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Outcome::Answered(answer) => Some(answer),
            _ => None,
        }
    }
}

/// Build the question's TF-IDF vector against the pack's vocabulary.
///
/// Terms outside the vocabulary are dropped. Returns `None` if nothing is
/// left.
fn query_vector(question: &str, pack: &LoadedPack) -> Option<(SparseVector, f64)> {
    let mut counts: HashMap<u32, u32> = HashMap::new();
    let mut unknown = 0usize;
    for term in pack.tokenizer.tokens(question) {
        match pack.vocabulary.get(&term) {
            Some(i) => *counts.entry(i).or_default() += 1,
            None => unknown += 1,
        }
    }
    tracing::debug!(known = counts.len(), unknown, "tokenized question");
    if counts.is_empty() {
        return None;
    }

    let idf = &pack.pack.idf;
    let vector = SparseVector::from_unsorted(
        counts
            .into_iter()
            .map(|(i, tf)| (i, f64::from(tf) * idf[i as usize]))
            .collect(),
    );
    let norm = vector.norm();
    Some((vector, norm))
}

fn score_all(query: &SparseVector, query_norm: f64, chunks: &[Chunk]) -> Vec<Scored> {
    let mut scored: Vec<Scored> = chunks
        .iter()
        .map(|chunk| Scored {
            chunk_id: chunk.id,
            score: chunk.vector.cosine(chunk.norm, query, query_norm),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });
    scored
}

/// Score every chunk against `question`, best first.
///
/// Ties keep document order. Returns an empty list when the question has
/// no term in the vocabulary.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeConfig;
/// use vitae_index::chunker::Passage;
/// use vitae_query::{rank, LoadedPack};
///
/// let passages = [
///     Passage { text: "Worked on distributed systems at Acme".into(), section: None },
///     Passage { text: "Studied computer science at State University".into(), section: None },
/// ];
/// let pack = LoadedPack::new(vitae_index::pack_passages(&passages, &VitaeConfig::default())).unwrap();
/// let ranked = rank("distributed systems experience", &pack);
/// assert_eq!(ranked[0].chunk_id, 0);
/// assert!(ranked[0].score > ranked[1].score);
/// ```
pub fn rank(question: &str, pack: &LoadedPack) -> Vec<Scored> {
    match query_vector(question, pack) {
        Some((query, norm)) => score_all(&query, norm, &pack.pack.chunks),
        None => Vec::new(),
    }
}

/// Answer `question` from `pack` with the top passages that clear the
/// relevance threshold.
///
/// The answer is extractive: passage text is concatenated verbatim in
/// ranked order.
pub fn answer(question: &str, pack: &LoadedPack, options: &QueryOptions) -> Outcome {
    if pack.pack.is_empty() {
        return Outcome::NoMatch {
            reason: NoMatchReason::EmptyPack,
        };
    }
    let Some((query, query_norm)) = query_vector(question, pack) else {
        return Outcome::NoMatch {
            reason: NoMatchReason::NoKnownTerms,
        };
    };

    let chunks = &pack.pack.chunks;
    let mut selected: Vec<(&Chunk, f64)> = Vec::new();
    for scored in score_all(&query, query_norm, chunks) {
        if selected.len() >= options.top_k || scored.score <= options.min_score {
            break;
        }
        let chunk = &chunks[scored.chunk_id];
        if let Some(threshold) = options.dedup_threshold {
            let duplicate = selected.iter().any(|(kept, _)| {
                kept.vector.cosine(kept.norm, &chunk.vector, chunk.norm) >= threshold
            });
            if duplicate {
                tracing::debug!(chunk = chunk.id, "skipping near-duplicate passage");
                continue;
            }
        }
        selected.push((chunk, scored.score));
    }

    if selected.is_empty() {
        return Outcome::NoMatch {
            reason: NoMatchReason::BelowThreshold,
        };
    }

    let assembled = selected
        .iter()
        .map(|(chunk, _)| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let matches = selected
        .into_iter()
        .map(|(chunk, score)| Match {
            chunk_id: chunk.id,
            score,
            text: chunk.text.clone(),
            section: chunk.section.clone(),
        })
        .collect();

    Outcome::Answered(Answer { matches, assembled })
}
