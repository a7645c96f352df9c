//! Topic entity and version types.
//!
//! A `TopicEntity` is the stable identity of a proposed research topic.
//! Each content snapshot lives in a `TopicVersion` with its own approval
//! lifecycle. Entities are never deleted; content changes arrive as new
//! versions with increasing sequence numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::new_id;

/// Lifecycle status of a topic version.
///
/// `Submitted` is the only state from which a decision can be made.
/// `Superseded` marks a previously approved version whose entity pointer
/// has moved to a newer approval; the historical record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Submitted,
    Approved,
    Rejected,
    Superseded,
}

impl VersionStatus {
    /// Whether a reviewer decision has been recorded for this status.
    pub fn is_decided(&self) -> bool {
        !matches!(self, VersionStatus::Submitted)
    }
}

/// Content snapshot of a research topic proposal.
///
/// Field set mirrors the submission form: bilingual titles, an
/// abbreviation, the problem/context/content/description/objectives
/// sections, a category, and the team constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicContent {
    /// English title
    pub en_title: String,
    /// Vietnamese title
    pub vn_title: String,
    /// Short uppercase abbreviation (e.g. "RORS")
    pub abbreviation: String,
    /// Problem the topic addresses
    pub problem: String,
    /// Research context
    pub context: String,
    /// Main research content
    pub content: String,
    /// Detailed description
    pub description: String,
    /// Concrete objectives
    pub objectives: String,
    /// Category label (e.g. "Artificial Intelligence")
    pub category: String,
    /// Team size constraint; must be 4 or 5
    pub team_size: u8,
    /// Suggested member roles for the team
    pub suggested_roles: Vec<String>,
}

impl TopicContent {
    /// Validate structural constraints shared by submissions and
    /// generated drafts: required fields non-empty, team size in {4, 5},
    /// at least one suggested role.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required: [(&'static str, &str); 7] = [
            ("en_title", &self.en_title),
            ("vn_title", &self.vn_title),
            ("problem", &self.problem),
            ("context", &self.context),
            ("description", &self.description),
            ("objectives", &self.objectives),
            ("category", &self.category),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::EmptyField(name));
            }
        }
        if !matches!(self.team_size, 4 | 5) {
            return Err(ValidationError::TeamSize(self.team_size));
        }
        if self.suggested_roles.is_empty() {
            return Err(ValidationError::NoRoles);
        }
        Ok(())
    }

    /// Deterministic concatenation of the comparable fields, in fixed
    /// order, for embedding input. Equal content always yields the same
    /// bundle regardless of how the fields were populated upstream.
    pub fn text_bundle(&self) -> String {
        [
            &self.en_title,
            &self.vn_title,
            &self.problem,
            &self.description,
            &self.objectives,
        ]
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }

    /// Default member roles for a team of 4 or 5 students.
    pub fn default_roles(team_size: u8) -> Vec<String> {
        let mut roles = vec![
            "Team Lead/PM".to_string(),
            "Backend Developer".to_string(),
            "Frontend Developer".to_string(),
            "AI/ML Engineer".to_string(),
        ];
        if team_size == 5 {
            roles.push("QA/DevOps".to_string());
        }
        roles
    }
}

/// Stable identity for a research topic across revisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicEntity {
    /// Entity identifier (ULID)
    pub entity_id: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Version currently holding the approval, if any.
    /// Updated only by the version store under a per-entity lock.
    pub current_approved_version: Option<String>,
}

impl TopicEntity {
    /// Create a new entity with a fresh ULID and no approved version.
    pub fn new() -> Self {
        Self {
            entity_id: new_id(),
            created_at: Utc::now(),
            current_approved_version: None,
        }
    }
}

impl Default for TopicEntity {
    fn default() -> Self {
        Self::new()
    }
}

/// One immutable content snapshot under a topic entity.
///
/// Immutable once created except for `status` and the decision metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicVersion {
    /// Version identifier (ULID)
    pub version_id: String,

    /// Parent entity identifier
    pub entity_id: String,

    /// Monotonically increasing sequence number per entity, starting at 1
    pub sequence: u32,

    /// Content snapshot
    pub content: TopicContent,

    /// Lifecycle status
    pub status: VersionStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// When the approve/reject/supersede decision was recorded
    pub decided_at: Option<DateTime<Utc>>,

    /// Reviewer who made the decision
    pub decided_by: Option<String>,

    /// Reason attached to the decision (rejections mostly)
    pub decision_reason: Option<String>,
}

impl TopicVersion {
    /// Create a new version in `Submitted` state.
    pub fn new(entity_id: impl Into<String>, sequence: u32, content: TopicContent) -> Self {
        Self {
            version_id: new_id(),
            entity_id: entity_id.into(),
            sequence,
            content,
            status: VersionStatus::Submitted,
            created_at: Utc::now(),
            decided_at: None,
            decided_by: None,
            decision_reason: None,
        }
    }
}
