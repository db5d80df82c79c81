//! Error types for codescope-index.

use codescope_embed::EmbedError;
use codescope_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Invalid settings, including a collection whose shape disagrees with the
    /// configured model or metric.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("embedding provider failed to initialize: {0}")]
    ProviderInit(#[source] EmbedError),

    #[error("embedding failed: {0}")]
    Embedding(#[source] EmbedError),

    #[error("vector store error: {0}")]
    Store(#[source] VectorStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file enumeration failed: {0}")]
    Walk(String),

    #[error("watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("an indexing run is already in progress")]
    AlreadyRunning,

    #[error("collection {0} not found, run index first")]
    CollectionMissing(String),
}

impl From<VectorStoreError> for IndexError {
    fn from(err: VectorStoreError) -> Self {
        match err {
            VectorStoreError::DimensionMismatch { .. }
            | VectorStoreError::DistanceMismatch { .. } => Self::Config(err.to_string()),
            other => Self::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
