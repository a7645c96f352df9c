//! Duplicate reports, candidate drafts, and suggestion criteria.

use serde::{Deserialize, Serialize};

use crate::topic::TopicContent;

/// Duplicate-classification tier for one detection call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Best score below the soft band; candidate is considered unique.
    NoMatch,
    /// Best score within the soft band below the threshold.
    SoftMatch,
    /// Best score at or above the threshold.
    HardMatch,
}

impl MatchTier {
    /// Whether this tier requires revision or human attention.
    pub fn is_flagged(&self) -> bool {
        !matches!(self, MatchTier::NoMatch)
    }
}

/// One approved version matched by a similarity query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMatch {
    pub entity_id: String,
    pub version_id: String,
    /// Similarity score in [0, 1]
    pub score: f32,
}

/// Ephemeral result of one duplicate-detection call.
///
/// Not persisted beyond the pipeline run that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Classification tier derived from the best live match.
    pub tier: MatchTier,

    /// Best live match, if any survived the liveness check.
    pub best_match: Option<TopicMatch>,

    /// Top-K live matches, ordered by descending score.
    pub matches: Vec<TopicMatch>,

    /// Threshold the classification was made against.
    pub threshold: f32,
}

impl DuplicateReport {
    /// Report for a query that found no live matches.
    pub fn no_match(threshold: f32) -> Self {
        Self {
            tier: MatchTier::NoMatch,
            best_match: None,
            matches: Vec::new(),
            threshold,
        }
    }

    /// Best similarity score, or 0.0 when nothing matched.
    pub fn best_score(&self) -> f32 {
        self.best_match.as_ref().map(|m| m.score).unwrap_or(0.0)
    }
}

/// A candidate topic draft, produced by the suggestion generator or
/// supplied directly by the caller. Drafts satisfy the same structural
/// constraints as version creation input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDraft {
    /// Draft content
    pub content: TopicContent,

    /// Why this draft fits the criteria (generator output, optional)
    pub rationale: Option<String>,
}

impl CandidateDraft {
    /// Wrap content without a rationale.
    pub fn from_content(content: TopicContent) -> Self {
        Self {
            content,
            rationale: None,
        }
    }
}

/// Criteria recognized by the suggestion generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionCriteria {
    /// Target semester label
    pub semester: String,

    /// Preferred category, if any
    pub category_preference: Option<String>,

    /// Keywords of interest
    pub keywords: Vec<String>,

    /// Supervisor expertise areas
    pub supervisor_expertise: Vec<String>,

    /// Student level (e.g. "undergraduate")
    pub student_level: String,

    /// Requested team size; must be 4 or 5
    pub team_size: u8,
}

impl Default for SuggestionCriteria {
    fn default() -> Self {
        Self {
            semester: String::new(),
            category_preference: None,
            keywords: Vec::new(),
            supervisor_expertise: Vec::new(),
            student_level: "undergraduate".to_string(),
            team_size: 4,
        }
    }
}

impl SuggestionCriteria {
    /// Team size clamped to the allowed set; unknown values fall back to 4.
    pub fn effective_team_size(&self) -> u8 {
        if matches!(self.team_size, 4 | 5) {
            self.team_size
        } else {
            4
        }
    }
}
