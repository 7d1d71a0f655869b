//! Turning a source document into raw text.
//!
//! Binary formats such as PDF are handled by an external extraction step;
//! this crate only reads documents that already are text.

use std::path::Path;

use vitae_core::VitaeError;

/// Produces the raw text of a source document.
pub trait Extractor {
    /// Extract the full text of the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VitaeError::Extraction`] if the document cannot be turned
    /// into text, or [`VitaeError::FileNotFound`] if it does not exist.
    fn extract(&self, path: &Path) -> Result<String, VitaeError>;
}

/// Reads UTF-8 text documents (`.txt`, `.text`, `.md`, `.markdown`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vitae_core::VitaeError;
/// use vitae_index::extract::{Extractor, PlainTextExtractor};
///
/// let err = PlainTextExtractor::default()
///     .extract(Path::new("resume.pdf"))
///     .unwrap_err();
/// assert!(matches!(err, VitaeError::Extraction { .. } | VitaeError::FileNotFound(_)));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor {
    /// Accept any extension and treat the file as text.
    pub force: bool,
}

const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown"];

impl PlainTextExtractor {
    fn accepts(&self, path: &Path) -> bool {
        if self.force {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| TEXT_EXTENSIONS.iter().any(|t| t.eq_ignore_ascii_case(e)))
    }
}

impl Extractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, VitaeError> {
        if !path.exists() {
            return Err(VitaeError::FileNotFound(path.to_path_buf()));
        }
        if !self.accepts(path) {
            return Err(VitaeError::Extraction {
                path: path.to_path_buf(),
                reason: "unsupported document format".into(),
            });
        }

        let bytes = std::fs::read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| VitaeError::Extraction {
            path: path.to_path_buf(),
            reason: format!("not valid UTF-8 ({e})"),
        })?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "extracted text");
        Ok(text)
    }
}
