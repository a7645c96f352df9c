//! Error types for version store operations.

use thiserror::Error;

use capbot_types::ValidationError;

/// Error raised by the version store.
///
/// Validation and lifecycle errors indicate a caller or data bug and are
/// surfaced immediately, never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Content failed structural validation.
    #[error("invalid content: {0}")]
    InvalidContent(#[from] ValidationError),

    /// The requested lifecycle transition is not allowed from the
    /// current status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Unknown entity or version.
    #[error("not found: {0}")]
    NotFound(String),

    /// The persistence backend failed.
    #[error("storage error: {0}")]
    Storage(String),
}
