//! # capbot-types
//!
//! Shared domain types for the capbot topic lifecycle core.
//!
//! Defines the versioned topic entity model, candidate drafts, duplicate
//! reports, indexing obligations, and the configuration structs used across
//! the workspace. All persistent types are serde-serializable so storage
//! backends can encode them however they like.

pub mod config;
pub mod error;
pub mod outbox;
pub mod report;
pub mod topic;

pub use config::{DetectorConfig, PipelineConfig, RevisionConfig, SuggestionConfig};
pub use error::ValidationError;
pub use outbox::IndexObligation;
pub use report::{CandidateDraft, DuplicateReport, MatchTier, SuggestionCriteria, TopicMatch};
pub use topic::{TopicContent, TopicEntity, TopicVersion, VersionStatus};

/// Generate a new ULID-based identifier.
pub fn new_id() -> String {
    ulid::Ulid::new().to_string()
}
