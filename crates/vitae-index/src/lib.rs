//! Offline pack builder: resume text in, TF-IDF retrieval pack out.
//!
//! The pipeline is document text → [`chunker::Chunker`] → passages →
//! [`vectorizer::Vectorizer`] (using [`tokenizer::Tokenizer`]) →
//! [`pack::Pack`]. Packs are rebuilt wholesale whenever the source changes.

pub mod chunker;
pub mod extract;
pub mod normalize;
pub mod pack;
pub mod sparse;
pub mod tokenizer;
pub mod vectorizer;

use vitae_core::VitaeConfig;

use crate::chunker::{Chunker, Passage};
use crate::pack::Pack;
use crate::tokenizer::Tokenizer;
use crate::vectorizer::Vectorizer;

/// Build a pack from the full text of a document.
///
/// Empty or whitespace-only text produces a valid pack with no chunks.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeConfig;
///
/// let text = "EXPERIENCE\n\
///             - Worked on distributed systems at Acme for five years\n\
///             - Studied computer science at State University evenings";
/// let pack = vitae_index::build_pack(text, &VitaeConfig::default());
/// assert_eq!(pack.chunks.len(), 2);
/// assert_eq!(pack.idf.len(), pack.vocab.len());
/// ```
pub fn build_pack(text: &str, config: &VitaeConfig) -> Pack {
    let passages = Chunker::new(&config.chunker).chunk(text);
    tracing::debug!(passages = passages.len(), "chunked document");
    if passages.is_empty() {
        tracing::warn!("document produced no passages, the pack will be empty");
    }
    pack_passages(&passages, config)
}

/// Build a pack from passages that were already segmented.
pub fn pack_passages(passages: &[Passage], config: &VitaeConfig) -> Pack {
    let tokenizer = Tokenizer::new(&config.tokenizer);
    let vectorized = Vectorizer::new(tokenizer, &config.vectorizer).vectorize(passages);
    Pack::new(config.tokenizer.clone(), vectorized)
}
