//! TF-IDF weighting over a passage set.

use std::collections::HashMap;

use vitae_core::{Smoothing, VectorizerConfig};

use crate::chunker::Passage;
use crate::pack::Chunk;
use crate::sparse::SparseVector;
use crate::tokenizer::Tokenizer;

/// Term to index mapping with indices assigned in first-seen order.
///
/// # Examples
///
/// ```
/// use vitae_index::vectorizer::Vocabulary;
///
/// let mut vocab = Vocabulary::default();
/// assert_eq!(vocab.intern("rust"), 0);
/// assert_eq!(vocab.intern("go"), 1);
/// assert_eq!(vocab.intern("rust"), 0);
/// assert_eq!(vocab.get("go"), Some(1));
/// assert_eq!(vocab.get("java"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    /// Rebuild from terms listed in index order.
    ///
    /// # Errors
    ///
    /// Returns the first term that appears twice.
    pub fn from_terms(terms: Vec<String>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(terms.len());
        for (i, term) in terms.iter().enumerate() {
            if index.insert(term.clone(), i as u32).is_some() {
                return Err(term.clone());
            }
        }
        Ok(Self { terms, index })
    }

    /// Index of `term`, assigning the next free one if unseen.
    pub fn intern(&mut self, term: &str) -> u32 {
        if let Some(&i) = self.index.get(term) {
            return i;
        }
        let i = self.terms.len() as u32;
        self.terms.push(term.to_string());
        self.index.insert(term.to_string(), i);
        i
    }

    /// Index of `term`, if known.
    pub fn get(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }

    /// Term at `index`, if in range.
    pub fn term(&self, index: u32) -> Option<&str> {
        self.terms.get(index as usize).map(String::as_str)
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether no terms are known.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Consume into terms in index order.
    pub fn into_terms(self) -> Vec<String> {
        self.terms
    }
}

/// Output of [`Vectorizer::vectorize`].
#[derive(Debug, Clone, Default)]
pub struct Vectorized {
    /// Every distinct term across the kept chunks.
    pub vocabulary: Vocabulary,
    /// Idf per vocabulary index.
    pub idf: Vec<f64>,
    /// Weighted chunks, ids assigned in passage order.
    pub chunks: Vec<Chunk>,
}

/// Computes vocabulary, idf table and per-chunk TF-IDF vectors.
///
/// # Examples
///
/// ```
/// use vitae_core::VectorizerConfig;
/// use vitae_index::chunker::Passage;
/// use vitae_index::tokenizer::Tokenizer;
/// use vitae_index::vectorizer::Vectorizer;
///
/// let vectorizer = Vectorizer::new(Tokenizer::default(), &VectorizerConfig::default());
/// let passages = vec![
///     Passage { text: "Rust services at Acme".into(), section: None },
///     Passage { text: "Go services at Initech".into(), section: None },
/// ];
/// let out = vectorizer.vectorize(&passages);
/// assert_eq!(out.vocabulary.terms(), &["rust", "services", "acme", "go", "initech"]);
/// assert_eq!(out.chunks.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Vectorizer {
    tokenizer: Tokenizer,
    smoothing: Smoothing,
    min_terms: usize,
}

impl Vectorizer {
    /// Create a vectorizer that tokenizes with `tokenizer`.
    pub fn new(tokenizer: Tokenizer, config: &VectorizerConfig) -> Self {
        Self {
            tokenizer,
            smoothing: config.smoothing,
            min_terms: config.min_terms.max(1),
        }
    }

    /// Weight every passage.
    ///
    /// Passages yielding fewer than `min_terms` index terms are left out and
    /// do not count towards document frequencies. No passages gives an empty
    /// result.
    pub fn vectorize(&self, passages: &[Passage]) -> Vectorized {
        let mut vocabulary = Vocabulary::default();
        let mut term_counts: Vec<Vec<(u32, u32)>> = Vec::new();
        let mut kept: Vec<&Passage> = Vec::new();

        for passage in passages {
            let terms: Vec<String> = self.tokenizer.tokens(&passage.text).collect();
            if terms.len() < self.min_terms {
                tracing::warn!(text = %passage.text, "passage has too few index terms, skipping");
                continue;
            }

            let mut counts: Vec<(u32, u32)> = Vec::new();
            let mut slot: HashMap<u32, usize> = HashMap::new();
            for term in &terms {
                let i = vocabulary.intern(term);
                match slot.get(&i) {
                    Some(&s) => counts[s].1 += 1,
                    None => {
                        slot.insert(i, counts.len());
                        counts.push((i, 1));
                    }
                }
            }
            term_counts.push(counts);
            kept.push(passage);
        }

        let n = kept.len();
        let mut df = vec![0usize; vocabulary.len()];
        for counts in &term_counts {
            for &(i, _) in counts {
                df[i as usize] += 1;
            }
        }
        let idf: Vec<f64> = df.iter().map(|&d| self.smoothing.idf(n, d)).collect();

        let chunks: Vec<Chunk> = kept
            .into_iter()
            .zip(term_counts)
            .enumerate()
            .map(|(id, (passage, counts))| {
                let vector = SparseVector::from_unsorted(
                    counts
                        .into_iter()
                        .map(|(i, tf)| (i, f64::from(tf) * idf[i as usize]))
                        .collect(),
                );
                let norm = vector.norm();
                Chunk {
                    id,
                    text: passage.text.clone(),
                    section: passage.section.clone(),
                    vector,
                    norm,
                }
            })
            .collect();

        tracing::debug!(
            chunks = chunks.len(),
            vocabulary = vocabulary.len(),
            "vectorized passages"
        );

        Vectorized {
            vocabulary,
            idf,
            chunks,
        }
    }

    /// Tokenizer used for term extraction.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }
}
