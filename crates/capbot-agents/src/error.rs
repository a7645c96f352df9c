//! Error types for the agent crates.

use thiserror::Error;

use capbot_index::IndexError;
use capbot_store::StoreError;

use crate::client::GenerativeError;

/// Error raised by the duplicate detector.
///
/// Propagated, never degraded to NoMatch: a false NoMatch would commit a
/// duplicate topic, which is worse than an explicit failure.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The embedding provider could not produce a vector.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The similarity index or version store backend failed.
    #[error("detector backend error: {0}")]
    Backend(String),
}

impl From<IndexError> for DetectorError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Embedding(e) => DetectorError::EmbeddingUnavailable(e.to_string()),
            IndexError::Store(msg) => DetectorError::Backend(msg),
        }
    }
}

impl From<StoreError> for DetectorError {
    fn from(err: StoreError) -> Self {
        DetectorError::Backend(err.to_string())
    }
}

/// Error raised by the modification engine.
///
/// Generative failures and malformed output consume revision attempts
/// instead of surfacing here; only correctness-bearing backend failures
/// propagate.
#[derive(Debug, Error)]
pub enum RevisionError {
    /// Re-checking the revised candidate failed.
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// The generative capability failed on every attempt.
    #[error(transparent)]
    Generative(#[from] GenerativeError),
}
