//! Error types for embedding generation.

use thiserror::Error;

/// Error raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider backend is unreachable or failing. Propagated, never
    /// silently degraded: a false no-match is worse than an explicit
    /// failure.
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    /// Input text was empty after normalization.
    #[error("cannot embed empty text")]
    EmptyInput,

    /// A stored vector does not match the provider dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
