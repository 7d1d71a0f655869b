use std::path::PathBuf;

/// Errors that can occur while building or loading a retrieval pack.
///
/// Library crates return this type directly; the binary surfaces it through
/// `miette` at the boundary, which is why every variant carries a
/// diagnostic code.
///
/// A question that matches nothing is not an error: see
/// `vitae_query::Outcome`.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeError;
///
/// let err = VitaeError::MalformedPack("chunk 3 references term 99".into());
/// assert!(err.to_string().contains("term 99"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum VitaeError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(vitae::io))]
    Io(#[from] std::io::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    #[diagnostic(code(vitae::config), help("run `vitae init` to see every option with its default"))]
    Config(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(vitae::toml))]
    Toml(#[from] toml::de::Error),

    /// The source document could not be turned into text.
    #[error("text extraction failed for {}: {reason}", .path.display())]
    #[diagnostic(
        code(vitae::extraction),
        help("extract the document to plain text first, or pass a .txt/.md file")
    )]
    Extraction {
        /// Document that failed to extract.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// Extraction succeeded but produced no usable passages.
    #[error("document produced no usable text")]
    #[diagnostic(
        code(vitae::empty_document),
        help("drop --fail-on-empty to write an empty, answerless pack instead")
    )]
    EmptyDocument,

    /// The pack is structurally invalid.
    #[error("malformed pack: {0}")]
    #[diagnostic(code(vitae::malformed_pack), help("rebuild the pack with `vitae build`"))]
    MalformedPack(String),

    /// The pack was written by an incompatible schema version.
    #[error("incompatible pack schema version {found} (expected {expected})")]
    #[diagnostic(
        code(vitae::incompatible_schema),
        help("rebuild the pack with this version of `vitae build`")
    )]
    IncompatibleSchema {
        /// Version found in the pack.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// JSON serialization failure.
    #[error("serialization error: {0}")]
    #[diagnostic(code(vitae::serialization))]
    Serialization(#[from] serde_json::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(vitae::file_not_found))]
    FileNotFound(PathBuf),
}
