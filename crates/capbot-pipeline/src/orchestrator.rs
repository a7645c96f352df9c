//! The pipeline orchestrator: suggestion, duplicate checking, revision,
//! and commit, as one finite-state run.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use capbot_agents::{
    DetectorError, DuplicateDetector, GenerativeClient, ModificationEngine, RevisionError,
    RevisionOutcome, SuggestionGenerator,
};
use capbot_index::SimilarityIndex;
use capbot_store::{Reconciler, StoreError, VersionStore, VersionTarget};
use capbot_types::{CandidateDraft, DuplicateReport, PipelineConfig};

use crate::outcome::{FailureCause, PipelineOutcome, SubmitOptions, SubmitRequest};

/// Stage of a pipeline run, for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStage {
    Suggesting,
    Checking,
    Revising,
    Committing,
}

/// Drives one submission through the full pipeline.
///
/// Each run is independent: the only shared mutable state between
/// concurrent runs is the version store and the similarity index, which
/// enforce their own invariants.
pub struct Orchestrator {
    store: Arc<VersionStore>,
    detector: Arc<DuplicateDetector>,
    suggester: SuggestionGenerator,
    reviser: ModificationEngine,
    reconciler: Reconciler,
}

impl Orchestrator {
    pub fn new(
        store: Arc<VersionStore>,
        index: Arc<SimilarityIndex>,
        client: Arc<dyn GenerativeClient>,
        config: PipelineConfig,
    ) -> Self {
        let detector = Arc::new(DuplicateDetector::new(
            Arc::clone(&index),
            Arc::clone(&store),
            config.detector,
        ));
        Self {
            suggester: SuggestionGenerator::new(Arc::clone(&client), config.suggestion),
            reviser: ModificationEngine::new(client, Arc::clone(&detector), config.revision),
            reconciler: Reconciler::new(Arc::clone(&store), index),
            store,
            detector,
        }
    }

    /// Run one submission to a terminal outcome.
    ///
    /// Stages: Suggesting (skipped for direct content), Checking per
    /// candidate, Revising when flagged and allowed, Committing on a
    /// clean check. Escalated and Failed are terminal outcomes, never
    /// panics or hangs.
    #[instrument(skip(self, request, options))]
    pub async fn submit_for_review(
        &self,
        request: SubmitRequest,
        options: SubmitOptions,
    ) -> PipelineOutcome {
        let candidates = match request {
            SubmitRequest::Content(draft) => vec![draft],
            SubmitRequest::Criteria(criteria) => {
                debug!(stage = ?RunStage::Suggesting, "generating candidate drafts");
                self.suggester.generate(&criteria).await
            }
        };

        if !options.check_duplicates {
            // Caller explicitly skips detection; first candidate wins.
            let candidate = candidates.into_iter().next();
            return match candidate {
                Some(candidate) => self.commit(candidate, &options).await,
                None => PipelineOutcome::Failed {
                    cause: FailureCause::InvalidContent("no candidate to commit".to_string()),
                },
            };
        }

        // Checking: first candidate that clears detection is committed.
        // Among flagged candidates, remember the least-similar one as the
        // revision seed.
        let excluded = options.existing_entity.as_deref();
        let mut flagged: Option<(CandidateDraft, DuplicateReport)> = None;
        for candidate in candidates {
            debug!(stage = ?RunStage::Checking, title = %candidate.content.en_title, "checking candidate");
            let report = match self
                .detector
                .check(&candidate.content.text_bundle(), excluded)
                .await
            {
                Ok(report) => report,
                Err(e) => return PipelineOutcome::Failed { cause: e.into() },
            };

            if !report.tier.is_flagged() {
                return self.commit(candidate, &options).await;
            }

            let is_better = flagged
                .as_ref()
                .map(|(_, prior)| report.best_score() < prior.best_score())
                .unwrap_or(true);
            if is_better {
                flagged = Some((candidate, report));
            }
        }

        let Some((candidate, report)) = flagged else {
            return PipelineOutcome::Failed {
                cause: FailureCause::InvalidContent("no candidate to check".to_string()),
            };
        };

        if !options.auto_revise {
            info!(
                best_score = report.best_score(),
                "candidate flagged and auto-revision disabled, escalating"
            );
            return PipelineOutcome::Escalated { candidate, report };
        }

        debug!(stage = ?RunStage::Revising, best_score = report.best_score(), "revising flagged candidate");
        match self.reviser.revise(&candidate, &report, excluded).await {
            Ok(RevisionOutcome::Revised {
                candidate: revised,
                report: fresh,
                attempts,
            }) => {
                // The engine only returns Revised once its re-check (the
                // loop back through Checking) comes out clean.
                debug!(
                    attempts,
                    best_score = fresh.best_score(),
                    "revision cleared detection"
                );
                self.commit(revised, &options).await
            }
            Ok(RevisionOutcome::Exhausted { attempts }) => {
                info!(attempts, "revision budget exhausted, escalating");
                PipelineOutcome::Escalated { candidate, report }
            }
            Err(e) => PipelineOutcome::Failed { cause: e.into() },
        }
    }

    /// Commit: create the version, approve it, and drive the indexing
    /// obligation. An indexing failure after a successful approval still
    /// commits; the approved-but-unindexed state is repaired by the next
    /// reconciliation pass.
    async fn commit(&self, candidate: CandidateDraft, options: &SubmitOptions) -> PipelineOutcome {
        debug!(stage = ?RunStage::Committing, title = %candidate.content.en_title, "committing candidate");

        let target = match &options.existing_entity {
            Some(entity_id) => VersionTarget::Existing(entity_id.clone()),
            None => VersionTarget::NewEntity,
        };
        let version = match self.store.create_version(target, candidate.content).await {
            Ok(version) => version,
            Err(e) => return PipelineOutcome::Failed { cause: e.into() },
        };

        // An existing entity may already hold an approval; replace it
        // rather than failing the run.
        let has_current = match &options.existing_entity {
            Some(entity_id) => match self.store.get_current_approved(entity_id).await {
                Ok(current) => current.is_some(),
                Err(e) => return PipelineOutcome::Failed { cause: e.into() },
            },
            None => false,
        };
        let approval = if has_current {
            self.store
                .supersede(&version.version_id, &options.reviewer)
                .await
        } else {
            self.store.approve(&version.version_id, &options.reviewer).await
        };
        if let Err(e) = approval {
            return PipelineOutcome::Failed { cause: e.into() };
        }

        match self.reconciler.drive_outbox().await {
            Ok(stats) if stats.failed > 0 => {
                warn!(
                    version_id = %version.version_id,
                    "indexing pending after commit, reconciliation will retry"
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    version_id = %version.version_id,
                    error = %e,
                    "indexing failed after commit, reconciliation will retry"
                );
            }
        }

        info!(
            entity_id = %version.entity_id,
            version_id = %version.version_id,
            "committed version"
        );
        PipelineOutcome::Committed {
            entity_id: version.entity_id,
            version_id: version.version_id,
        }
    }
}

impl From<DetectorError> for FailureCause {
    fn from(err: DetectorError) -> Self {
        match err {
            DetectorError::EmbeddingUnavailable(msg) => FailureCause::EmbeddingUnavailable(msg),
            DetectorError::Backend(msg) => FailureCause::StoreFailure(msg),
        }
    }
}

impl From<RevisionError> for FailureCause {
    fn from(err: RevisionError) -> Self {
        match err {
            RevisionError::Detector(e) => e.into(),
            RevisionError::Generative(e) => FailureCause::GenerativeUnavailable(e.to_string()),
        }
    }
}

impl From<StoreError> for FailureCause {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidContent(e) => FailureCause::InvalidContent(e.to_string()),
            StoreError::InvalidTransition(msg) => FailureCause::InvalidTransition(msg),
            StoreError::NotFound(msg) => FailureCause::NotFound(msg),
            StoreError::Storage(msg) => FailureCause::StoreFailure(msg),
        }
    }
}
