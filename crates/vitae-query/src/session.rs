//! Session-level pack lifecycle: load once, then answer from shared state.
//!
//! Loading is asynchronous because the pack may come from disk or the
//! network; answering is synchronous and atomic. A question that arrives
//! before the pack is ready gets [`Outcome::NotReady`] instead of racing
//! the load.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use vitae_core::VitaeError;

use crate::engine::{answer, LoadedPack, Outcome, QueryOptions};

/// Where a pack's JSON comes from.
pub trait PackSource {
    /// Fetch the raw pack document.
    fn read(&self) -> impl Future<Output = Result<String, VitaeError>> + Send;
}

/// A pack stored in a file.
#[derive(Debug, Clone)]
pub struct FileSource(pub PathBuf);

impl PackSource for FileSource {
    fn read(&self) -> impl Future<Output = Result<String, VitaeError>> + Send {
        let path = self.0.clone();
        async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(json) => Ok(json),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(VitaeError::FileNotFound(path))
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}

/// A pack already held in memory, e.g. one bundled into the host.
#[derive(Debug, Clone)]
pub struct InlineSource(pub String);

impl PackSource for InlineSource {
    fn read(&self) -> impl Future<Output = Result<String, VitaeError>> + Send {
        let json = self.0.clone();
        async move { Ok(json) }
    }
}

/// Holds at most one pack for the lifetime of a session.
///
/// # Examples
///
/// ```
/// use vitae_core::VitaeConfig;
/// use vitae_query::{InlineSource, Outcome, PackSession, QueryOptions};
///
/// # async fn example() {
/// let session = PackSession::new();
/// assert_eq!(session.ask("rust", &QueryOptions::default()), Outcome::NotReady);
///
/// let json = vitae_index::build_pack("", &VitaeConfig::default()).to_json().unwrap();
/// session.load(&InlineSource(json)).await.unwrap();
/// assert!(session.is_ready());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct PackSession {
    slot: OnceCell<Arc<LoadedPack>>,
}

impl PackSession {
    /// Create a session with no pack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the session's pack from `source`.
    ///
    /// The first successful load wins; later calls return the pack already
    /// held without reading `source`. Concurrent callers wait for the load
    /// in flight. A failed load leaves the session not ready so it can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns the source's read error, or the validation error of a
    /// malformed or incompatible pack.
    pub async fn load<S: PackSource>(&self, source: &S) -> Result<Arc<LoadedPack>, VitaeError> {
        let pack = self
            .slot
            .get_or_try_init(|| async {
                let json = source.read().await?;
                let loaded = LoadedPack::from_json(&json)?;
                tracing::info!(
                    chunks = loaded.pack().chunks.len(),
                    vocabulary = loaded.pack().vocab.len(),
                    "pack loaded"
                );
                Ok::<_, VitaeError>(Arc::new(loaded))
            })
            .await?;
        Ok(Arc::clone(pack))
    }

    /// Whether a pack has been loaded.
    pub fn is_ready(&self) -> bool {
        self.slot.initialized()
    }

    /// The loaded pack, if any.
    pub fn pack(&self) -> Option<Arc<LoadedPack>> {
        self.slot.get().cloned()
    }

    /// Answer `question`, or report [`Outcome::NotReady`] before load.
    pub fn ask(&self, question: &str, options: &QueryOptions) -> Outcome {
        match self.slot.get() {
            Some(pack) => answer(question, pack, options),
            None => Outcome::NotReady,
        }
    }
}
