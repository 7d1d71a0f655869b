//! Core types, configuration, and error handling for vitae.
//!
//! This crate provides the shared foundation used by the other vitae crates:
//! - [`VitaeError`]: unified error type using `thiserror` and `miette`
//! - [`VitaeConfig`]: configuration loaded from `.vitae.toml`
//! - Shared types: [`OutputFormat`], [`Section`]

mod config;
mod error;
mod types;

pub use config::{
    ChunkerConfig, QueryConfig, Smoothing, TokenizerConfig, VectorizerConfig, VitaeConfig,
};
pub use error::VitaeError;
pub use types::{OutputFormat, Section};

/// A convenience `Result` type for vitae operations.
pub type Result<T> = std::result::Result<T, VitaeError>;
