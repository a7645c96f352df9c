//! Modification engine: bounded automatic revision of flagged candidates.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use capbot_types::{CandidateDraft, DuplicateReport, RevisionConfig, TopicContent};

use crate::client::{extract_json, GenerativeClient};
use crate::detector::DuplicateDetector;
use crate::error::RevisionError;

/// Revision state for one flagged candidate within a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionState {
    /// Candidate flagged as a soft or hard match.
    Flagged,
    /// An attempt is in flight.
    Revising,
    /// A revision with decreased similarity was produced.
    Revised,
    /// The attempt budget ran out without an acceptable revision.
    Exhausted,
}

/// Result of driving one candidate through the revision state machine.
#[derive(Debug)]
pub enum RevisionOutcome {
    /// A revision that cleared detection, with its fresh duplicate report.
    Revised {
        candidate: CandidateDraft,
        report: DuplicateReport,
        attempts: u32,
    },
    /// Attempt budget exhausted; requires a human decision.
    Exhausted { attempts: u32 },
}

/// Raw revised draft as parsed from model output.
#[derive(Debug, Deserialize)]
struct RawRevision {
    #[serde(default)]
    en_title: String,
    #[serde(default)]
    vn_title: String,
    #[serde(default)]
    abbreviation: String,
    #[serde(default)]
    problem: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    objectives: String,
    #[serde(default)]
    category: String,
}

/// Revises a candidate flagged by the duplicate detector.
///
/// Runs a bounded state machine: Flagged -> Revising -> {Revised,
/// Exhausted}. A revision counts as progress only when re-checking shows
/// its similarity to the flagged match actually decreased, not merely
/// that the text differs. Progress that still leaves the candidate
/// flagged becomes the baseline for the next attempt; `Revised` is
/// returned only once detection clears. Generative failures and
/// malformed output consume attempts; detector failures propagate
/// because they are correctness-bearing.
pub struct ModificationEngine {
    client: Arc<dyn GenerativeClient>,
    detector: Arc<DuplicateDetector>,
    config: RevisionConfig,
}

impl ModificationEngine {
    pub fn new(
        client: Arc<dyn GenerativeClient>,
        detector: Arc<DuplicateDetector>,
        config: RevisionConfig,
    ) -> Self {
        Self {
            client,
            detector,
            config,
        }
    }

    /// Drive the flagged candidate through bounded revision attempts.
    #[instrument(skip(self, candidate, report))]
    pub async fn revise(
        &self,
        candidate: &CandidateDraft,
        report: &DuplicateReport,
        excluded_entity_id: Option<&str>,
    ) -> Result<RevisionOutcome, RevisionError> {
        let mut current = candidate.clone();
        let mut current_report = report.clone();
        let mut baseline = report.best_score();

        for attempt in 1..=self.config.max_attempts {
            debug!(attempt, state = ?RevisionState::Revising, baseline, "starting revision attempt");
            let prompt = self.build_revision_prompt(&current, &current_report);

            let response = match self
                .client
                .complete(&prompt, self.config.temperature, self.config.max_output_tokens)
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "revision call failed, consuming attempt");
                    continue;
                }
            };

            let revised = match self.parse_revision(&response, &current.content) {
                Some(content) => content,
                None => {
                    warn!(attempt, "malformed revision output, consuming attempt");
                    continue;
                }
            };

            let fresh = self
                .detector
                .check(&revised.text_bundle(), excluded_entity_id)
                .await?;

            if fresh.best_score() >= baseline {
                warn!(
                    attempt,
                    baseline,
                    new_score = fresh.best_score(),
                    "revision did not decrease similarity, consuming attempt"
                );
                continue;
            }

            if !fresh.tier.is_flagged() {
                debug!(
                    attempt,
                    state = ?RevisionState::Revised,
                    baseline,
                    new_score = fresh.best_score(),
                    "revision cleared detection"
                );
                return Ok(RevisionOutcome::Revised {
                    candidate: CandidateDraft {
                        content: revised,
                        rationale: current.rationale.clone(),
                    },
                    report: fresh,
                    attempts: attempt,
                });
            }

            // Real progress but still flagged: revise from the improved
            // draft while attempts remain.
            debug!(
                attempt,
                baseline,
                new_score = fresh.best_score(),
                "revision improved but still flagged, continuing"
            );
            baseline = fresh.best_score();
            current = CandidateDraft {
                content: revised,
                rationale: current.rationale,
            };
            current_report = fresh;
        }

        warn!(state = ?RevisionState::Exhausted, "revision budget exhausted, escalating");
        Ok(RevisionOutcome::Exhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Parse a revised draft, keeping team composition from the original.
    fn parse_revision(&self, response: &str, original: &TopicContent) -> Option<TopicContent> {
        let json = extract_json(response);
        let raw: RawRevision = serde_json::from_str(&json).ok()?;

        let content = TopicContent {
            en_title: raw.en_title,
            vn_title: raw.vn_title,
            abbreviation: raw.abbreviation,
            problem: raw.problem,
            context: raw.context,
            content: raw.content,
            description: raw.description,
            objectives: raw.objectives,
            category: if raw.category.is_empty() {
                original.category.clone()
            } else {
                raw.category
            },
            team_size: original.team_size,
            suggested_roles: original.suggested_roles.clone(),
        };
        content.validate().ok()?;
        Some(content)
    }

    fn build_revision_prompt(&self, candidate: &CandidateDraft, report: &DuplicateReport) -> String {
        let best = report
            .best_match
            .as_ref()
            .map(|m| format!("{:.0}% similar to an approved topic", m.score * 100.0))
            .unwrap_or_else(|| "flagged as similar to an approved topic".to_string());

        format!(
            r#"This capstone topic draft is {best}. Rewrite it so it differs
substantially in problem, description, and objectives while staying in the
same general area.

CURRENT DRAFT:
- English title: {en_title}
- Vietnamese title: {vn_title}
- Problem: {problem}
- Context: {context}
- Content: {content}
- Description: {description}
- Objectives: {objectives}

Respond with JSON only:
{{"en_title": "...", "vn_title": "...", "abbreviation": "...", "problem": "...", "context": "...", "content": "...", "description": "...", "objectives": "...", "category": "{category}"}}"#,
            best = best,
            en_title = candidate.content.en_title,
            vn_title = candidate.content.vn_title,
            problem = candidate.content.problem,
            context = candidate.content.context,
            content = candidate.content.content,
            description = candidate.content.description,
            objectives = candidate.content.objectives,
            category = candidate.content.category,
        )
    }
}
