//! Indexing obligation for the approval outbox.
//!
//! Approval and indexing are two independently-failable steps. Approval
//! enqueues an obligation; a reconciliation pass guarantees eventual
//! consistency between the approved set and the indexed set, so a missed
//! entry is repaired rather than lost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An outstanding obligation to index an approved version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexObligation {
    /// Entity owning the approved version
    pub entity_id: String,

    /// Version to index
    pub version_id: String,

    /// When the obligation was enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl IndexObligation {
    /// Create an obligation for an approved version.
    pub fn new(entity_id: impl Into<String>, version_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            version_id: version_id.into(),
            enqueued_at: Utc::now(),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
