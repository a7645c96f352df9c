//! Pipeline request and outcome types.

use thiserror::Error;

use capbot_types::{CandidateDraft, DuplicateReport, SuggestionCriteria};

/// What the caller submits: finished content or generation criteria.
#[derive(Debug, Clone)]
pub enum SubmitRequest {
    /// A draft supplied directly by the caller.
    Content(CandidateDraft),
    /// Criteria for the suggestion generator to produce drafts from.
    Criteria(SuggestionCriteria),
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Run duplicate detection before committing.
    pub check_duplicates: bool,

    /// Attempt automatic revision when detection flags the candidate.
    pub auto_revise: bool,

    /// Reviewer recorded on the approval.
    pub reviewer: String,

    /// Entity this submission belongs to, when revising an existing
    /// topic. Skips comparison against the entity's own history and
    /// commits the new version under it (superseding a current
    /// approval).
    pub existing_entity: Option<String>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            check_duplicates: true,
            auto_revise: true,
            reviewer: "system".to_string(),
            existing_entity: None,
        }
    }
}

/// Cause kind attached to a `Failed` outcome for operator diagnosis.
#[derive(Debug, Error)]
pub enum FailureCause {
    /// Candidate content failed structural validation.
    #[error("invalid content: {0}")]
    InvalidContent(String),

    /// A lifecycle transition was rejected by the version store.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Unknown entity or version referenced by the run.
    #[error("not found: {0}")]
    NotFound(String),

    /// The embedding provider was unavailable during detection.
    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The generative capability failed where no fallback applies.
    #[error("generative capability unavailable: {0}")]
    GenerativeUnavailable(String),

    /// The persistence layer failed.
    #[error("store failure: {0}")]
    StoreFailure(String),
}

/// Terminal result of one pipeline run.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// A version was created, approved, and handed to indexing.
    Committed {
        entity_id: String,
        version_id: String,
    },

    /// Automated handling ran out; a human has to decide. A valid
    /// business outcome, not an error.
    Escalated {
        candidate: CandidateDraft,
        report: DuplicateReport,
    },

    /// The run could not complete; `cause` carries the failure kind.
    Failed { cause: FailureCause },
}

impl PipelineOutcome {
    /// Committed version id, if this run committed.
    pub fn committed_version(&self) -> Option<&str> {
        match self {
            PipelineOutcome::Committed { version_id, .. } => Some(version_id),
            _ => None,
        }
    }
}
