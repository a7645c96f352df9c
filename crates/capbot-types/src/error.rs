//! Structural validation errors for topic content.

use thiserror::Error;

/// Error raised when topic content fails structural validation.
///
/// Validation and lifecycle errors are never retried automatically; they
/// indicate a caller or data bug and are surfaced immediately.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required text field is empty or whitespace-only.
    #[error("required field is empty: {0}")]
    EmptyField(&'static str),

    /// Team size outside the allowed set {4, 5}.
    #[error("team size must be 4 or 5, got {0}")]
    TeamSize(u8),

    /// Suggested roles missing for the declared team size.
    #[error("expected at least one suggested role")]
    NoRoles,
}
