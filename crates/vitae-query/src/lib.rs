//! Online query engine over a vitae pack.
//!
//! Tokenizes a question with the pack's own tokenizer settings, scores it
//! against every chunk by cosine similarity and assembles an extractive
//! answer from the best passages. [`PackSession`] adds the load-once,
//! not-ready-until-loaded lifecycle a host application needs.

pub mod engine;
pub mod session;

pub use engine::{
    answer, rank, Answer, LoadedPack, Match, NoMatchReason, Outcome, QueryOptions, Scored,
};
pub use session::{FileSource, InlineSource, PackSession, PackSource};
