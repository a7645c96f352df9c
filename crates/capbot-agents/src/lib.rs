//! # capbot-agents
//!
//! The decision-making agents of the topic workflow: duplicate detection
//! against the approved set, suggestion generation with deterministic
//! fallback, and bounded automatic revision of flagged candidates.
//!
//! The generative capability is consumed through [`GenerativeClient`] and
//! its output is always treated as untrusted: parsed into a strict shape
//! and validated before anything downstream sees it.

pub mod client;
pub mod detector;
pub mod error;
pub mod mock;
pub mod revision;
pub mod suggestion;

pub use client::{extract_json, GenerativeClient, GenerativeError};
pub use detector::DuplicateDetector;
pub use error::{DetectorError, RevisionError};
pub use mock::MockGenerativeClient;
pub use revision::{ModificationEngine, RevisionOutcome, RevisionState};
pub use suggestion::SuggestionGenerator;
