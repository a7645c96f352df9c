//! Duplicate detection against the approved topic set.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use capbot_index::SimilarityIndex;
use capbot_store::VersionStore;
use capbot_types::{DetectorConfig, DuplicateReport, MatchTier, TopicMatch};

use crate::error::DetectorError;

/// Classifies a candidate text bundle against approved topic versions.
///
/// The index is allowed to be stale (an approval revoked after indexing),
/// so every hit is re-validated against the version store at call time
/// and stale ones are dropped before classification.
pub struct DuplicateDetector {
    index: Arc<SimilarityIndex>,
    store: Arc<VersionStore>,
    config: DetectorConfig,
}

impl DuplicateDetector {
    pub fn new(
        index: Arc<SimilarityIndex>,
        store: Arc<VersionStore>,
        config: DetectorConfig,
    ) -> Self {
        Self {
            index,
            store,
            config,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Check a text bundle for duplicates among currently approved
    /// versions.
    ///
    /// Classification: best score >= threshold is a hard match; best
    /// score >= threshold * soft_band_ratio is a soft match; anything
    /// lower is no match. An unavailable embedding provider is an error,
    /// never a silent NoMatch.
    #[instrument(skip(self, bundle))]
    pub async fn check(
        &self,
        bundle: &str,
        excluded_entity_id: Option<&str>,
    ) -> Result<DuplicateReport, DetectorError> {
        let hits = self
            .index
            .query(bundle, self.config.top_k, excluded_entity_id)
            .await?;

        let mut live: Vec<TopicMatch> = Vec::with_capacity(hits.len());
        for hit in hits {
            if self.store.is_version_approved(&hit.version_id).await? {
                live.push(hit);
            } else {
                warn!(
                    version_id = %hit.version_id,
                    "dropping stale index hit, version no longer approved"
                );
            }
        }

        let Some(best) = live.first().cloned() else {
            return Ok(DuplicateReport::no_match(self.config.threshold));
        };

        let tier = if best.score >= self.config.threshold {
            MatchTier::HardMatch
        } else if best.score >= self.config.soft_floor() {
            MatchTier::SoftMatch
        } else {
            MatchTier::NoMatch
        };

        debug!(
            best_entity = %best.entity_id,
            best_score = best.score,
            ?tier,
            live_matches = live.len(),
            "duplicate check complete"
        );

        Ok(DuplicateReport {
            tier,
            best_match: Some(best),
            matches: live,
            threshold: self.config.threshold,
        })
    }
}
