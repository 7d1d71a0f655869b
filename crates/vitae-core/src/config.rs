use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::VitaeError;

/// Top-level configuration loaded from `.vitae.toml`.
///
/// Supports layered resolution: CLI flags > local config > defaults.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeConfig;
///
/// let config = VitaeConfig::default();
/// assert_eq!(config.query.top_k, 3);
/// assert_eq!(config.chunker.max_chars, 600);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitaeConfig {
    /// Term extraction rules shared by the builder and the query engine.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Passage segmentation thresholds.
    #[serde(default)]
    pub chunker: ChunkerConfig,
    /// Statistical weighting settings.
    #[serde(default)]
    pub vectorizer: VectorizerConfig,
    /// Ranking and answer assembly settings.
    #[serde(default)]
    pub query: QueryConfig,
}

impl VitaeConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Io`] if the file cannot be read,
    /// [`VitaeError::Toml`] if the content is not valid TOML, or
    /// [`VitaeError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use vitae_core::VitaeConfig;
    /// use std::path::Path;
    ///
    /// let config = VitaeConfig::from_file(Path::new(".vitae.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, VitaeError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Toml`] if parsing fails, or
    /// [`VitaeError::Config`] if validation fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use vitae_core::VitaeConfig;
    ///
    /// let toml = r#"
    /// [query]
    /// top_k = 5
    /// "#;
    /// let config = VitaeConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.query.top_k, 5);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, VitaeError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Config`] describing the first violated constraint.
    pub fn validate(&self) -> Result<(), VitaeError> {
        if self.tokenizer.min_token_len == 0 {
            return Err(VitaeError::Config(
                "tokenizer.min_token_len must be at least 1".into(),
            ));
        }
        if self.chunker.min_chars >= self.chunker.max_chars {
            return Err(VitaeError::Config(format!(
                "chunker.min_chars ({}) must be below chunker.max_chars ({})",
                self.chunker.min_chars, self.chunker.max_chars
            )));
        }
        self.query.validate()
    }
}

/// Tokenizer settings.
///
/// These are embedded in every pack so that query-time tokenization uses
/// exactly the rules the pack was built with.
///
/// # Examples
///
/// ```
/// use vitae_core::TokenizerConfig;
///
/// let config = TokenizerConfig::default();
/// assert_eq!(config.min_token_len, 2);
/// assert!(config.stopwords.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Tokens shorter than this (in characters) are dropped unless whitelisted.
    #[serde(default = "default_min_token_len")]
    pub min_token_len: usize,
    /// Keep purely numeric tokens such as years.
    #[serde(default)]
    pub keep_numeric: bool,
    /// Fold accented Latin letters to their ASCII base (`zürich` matches
    /// `zurich`).
    #[serde(default = "default_fold_accents")]
    pub fold_accents: bool,
    /// Short tokens kept regardless of `min_token_len` (e.g. `"c"`, `"r"`).
    #[serde(default = "default_whitelist")]
    pub whitelist: Vec<String>,
    /// Full replacement for the built-in stopword list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
    /// Stopwords added on top of the active list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_stopwords: Vec<String>,
}

fn default_min_token_len() -> usize {
    2
}

fn default_fold_accents() -> bool {
    true
}

fn default_whitelist() -> Vec<String> {
    vec!["c".into(), "r".into()]
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            min_token_len: default_min_token_len(),
            keep_numeric: false,
            fold_accents: default_fold_accents(),
            whitelist: default_whitelist(),
            stopwords: None,
            extra_stopwords: Vec::new(),
        }
    }
}

/// Chunker thresholds.
///
/// # Examples
///
/// ```
/// use vitae_core::ChunkerConfig;
///
/// let config = ChunkerConfig::default();
/// assert_eq!(config.min_chars, 40);
/// assert_eq!(config.max_chars, 600);
/// assert_eq!(config.min_words, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Passages shorter than this are merged into a neighbour (default: 40).
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    /// Passages longer than this are split at a sentence boundary (default: 600).
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    /// Unmergeable fragments with fewer words are dropped (default: 3).
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    /// Lines recognised as section headings (matched case-insensitively).
    #[serde(default = "default_section_headings")]
    pub section_headings: Vec<String>,
}

fn default_min_chars() -> usize {
    40
}

fn default_max_chars() -> usize {
    600
}

fn default_min_words() -> usize {
    3
}

fn default_section_headings() -> Vec<String> {
    [
        "summary",
        "profile",
        "objective",
        "about",
        "experience",
        "work experience",
        "professional experience",
        "employment",
        "education",
        "skills",
        "technical skills",
        "projects",
        "certifications",
        "publications",
        "awards",
        "honors",
        "leadership",
        "volunteering",
        "research",
        "coursework",
        "activities",
        "interests",
        "languages",
        "contact",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chars: default_min_chars(),
            max_chars: default_max_chars(),
            min_words: default_min_words(),
            section_headings: default_section_headings(),
        }
    }
}

/// Inverse-document-frequency smoothing formula.
///
/// Every variant is monotonically non-increasing in document frequency, so
/// the choice changes score magnitudes but keeps rare terms ahead of common
/// ones.
///
/// # Examples
///
/// ```
/// use vitae_core::Smoothing;
///
/// // A term present in every chunk still carries weight under the default.
/// assert!(Smoothing::default().idf(4, 4) > 0.0);
/// assert_eq!(Smoothing::Plain.idf(4, 4), 0.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    /// `ln((1 + N) / (1 + df)) + 1`
    #[default]
    Smooth,
    /// `max(ln(N / df), 0)`
    Plain,
    /// `ln(1 + N / df)`
    Log1p,
}

impl Smoothing {
    /// Compute the idf of a term found in `df` of `n` chunks.
    ///
    /// A `df` of zero is treated as one.
    pub fn idf(self, n: usize, df: usize) -> f64 {
        let n = n as f64;
        let df = df.max(1) as f64;
        match self {
            Smoothing::Smooth => ((1.0 + n) / (1.0 + df)).ln() + 1.0,
            Smoothing::Plain => (n / df).ln().max(0.0),
            Smoothing::Log1p => (1.0 + n / df).ln(),
        }
    }
}

/// Vectorizer settings.
///
/// # Examples
///
/// ```
/// use vitae_core::{Smoothing, VectorizerConfig};
///
/// let config = VectorizerConfig::default();
/// assert_eq!(config.smoothing, Smoothing::Smooth);
/// assert_eq!(config.min_terms, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Idf smoothing formula (default: `"smooth"`).
    #[serde(default)]
    pub smoothing: Smoothing,
    /// Chunks with fewer index terms are left out of the pack (default: 1).
    #[serde(default = "default_min_terms")]
    pub min_terms: usize,
}

fn default_min_terms() -> usize {
    1
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            smoothing: Smoothing::default(),
            min_terms: default_min_terms(),
        }
    }
}

/// Query engine settings.
///
/// # Examples
///
/// ```
/// use vitae_core::QueryConfig;
///
/// let config = QueryConfig::default();
/// assert_eq!(config.top_k, 3);
/// assert_eq!(config.min_score, 0.05);
/// assert_eq!(config.dedup_threshold, Some(0.9));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum passages in an answer (default: 3).
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// A passage must score strictly above this to be used (default: 0.05).
    #[serde(default = "default_min_score")]
    pub min_score: f64,
    /// Skip passages that are near-duplicates of one already selected
    /// (default: true).
    #[serde(default = "default_dedup")]
    pub dedup: bool,
    /// Cosine similarity at which a passage counts as a near-duplicate
    /// (default: 0.9). Ignored when `dedup` is off.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: Option<f64>,
}

fn default_top_k() -> usize {
    3
}

fn default_min_score() -> f64 {
    0.05
}

fn default_dedup() -> bool {
    true
}

fn default_dedup_threshold() -> Option<f64> {
    Some(0.9)
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: default_min_score(),
            dedup: default_dedup(),
            dedup_threshold: default_dedup_threshold(),
        }
    }
}

impl QueryConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Config`] if `top_k` is zero or a threshold is
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), VitaeError> {
        if self.top_k == 0 {
            return Err(VitaeError::Config("query.top_k must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(VitaeError::Config(format!(
                "query.min_score must be within [0, 1], got {}",
                self.min_score
            )));
        }
        if let Some(t) = self.dedup_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(VitaeError::Config(format!(
                    "query.dedup_threshold must be within [0, 1], got {t}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = VitaeConfig::default();
        assert_eq!(config.tokenizer.min_token_len, 2);
        assert!(!config.tokenizer.keep_numeric);
        assert_eq!(config.tokenizer.whitelist, vec!["c", "r"]);
        assert_eq!(config.chunker.min_chars, 40);
        assert_eq!(config.chunker.max_chars, 600);
        assert!(config
            .chunker
            .section_headings
            .iter()
            .any(|h| h == "experience"));
        assert_eq!(config.vectorizer.smoothing, Smoothing::Smooth);
        assert_eq!(config.query.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[tokenizer]
min_token_len = 3
keep_numeric = true
whitelist = ["go"]
extra_stopwords = ["resume"]

[chunker]
min_chars = 20
max_chars = 300

[vectorizer]
smoothing = "log1p"

[query]
top_k = 5
min_score = 0.1
"#;
        let config = VitaeConfig::from_toml(toml).unwrap();
        assert_eq!(config.tokenizer.min_token_len, 3);
        assert!(config.tokenizer.keep_numeric);
        assert_eq!(config.tokenizer.whitelist, vec!["go"]);
        assert_eq!(config.tokenizer.extra_stopwords, vec!["resume"]);
        assert_eq!(config.chunker.max_chars, 300);
        assert_eq!(config.vectorizer.smoothing, Smoothing::Log1p);
        assert_eq!(config.query.top_k, 5);
        assert_eq!(config.query.dedup_threshold, Some(0.9));
    }

    #[test]
    fn dedup_switch_disables_threshold() {
        let config = VitaeConfig::from_toml("[query]\ndedup = false\n").unwrap();
        assert!(!config.query.dedup);
        assert_eq!(config.query.dedup_threshold, Some(0.9));

        let config = VitaeConfig::from_toml("[query]\ntop_k = 2\n").unwrap();
        assert!(config.query.dedup);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = VitaeConfig::from_toml("").unwrap();
        assert_eq!(config, VitaeConfig::default());
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(VitaeConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn inverted_chunk_bounds_rejected() {
        let toml = r#"
[chunker]
min_chars = 500
max_chars = 100
"#;
        let err = VitaeConfig::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("min_chars"));
    }

    #[test]
    fn zero_top_k_rejected() {
        let err = VitaeConfig::from_toml("[query]\ntop_k = 0\n").unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn out_of_range_min_score_rejected() {
        assert!(VitaeConfig::from_toml("[query]\nmin_score = 1.5\n").is_err());
    }

    #[test]
    fn smoothing_is_monotonic_in_document_frequency() {
        for smoothing in [Smoothing::Smooth, Smoothing::Plain, Smoothing::Log1p] {
            let rare = smoothing.idf(10, 1);
            let common = smoothing.idf(10, 9);
            assert!(rare > common, "{smoothing:?}: {rare} <= {common}");
            assert!(smoothing.idf(10, 10) >= 0.0);
        }
    }

    #[test]
    fn smooth_idf_matches_formula() {
        let expected = (3.0f64 / 2.0).ln() + 1.0;
        assert!((Smoothing::Smooth.idf(2, 1) - expected).abs() < 1e-12);
    }
}
