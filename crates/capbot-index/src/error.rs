//! Error types for the similarity index.

use thiserror::Error;

use capbot_embeddings::EmbeddingError;

/// Error raised by index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Embedding computation failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// The vector storage backend failed.
    #[error("vector store error: {0}")]
    Store(String),
}
