//! Reconciliation between the approved set and the similarity index.
//!
//! Approval and indexing are separate steps, so a crash or index outage
//! can leave an approved version unindexed or an indexed version whose
//! approval was since revoked. A full reconciliation pass repairs both
//! directions and is safe to run at any time.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use capbot_index::SimilarityIndex;

use crate::error::StoreError;
use crate::store::VersionStore;

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Approved versions that were missing from the index and got indexed.
    pub indexed: usize,
    /// Indexed versions no longer approved that were removed.
    pub removed: usize,
    /// Versions that failed to index and remain pending.
    pub failed: usize,
}

/// Aligns the similarity index with the version store's approved set.
pub struct Reconciler {
    store: Arc<VersionStore>,
    index: Arc<SimilarityIndex>,
}

impl Reconciler {
    pub fn new(store: Arc<VersionStore>, index: Arc<SimilarityIndex>) -> Self {
        Self { store, index }
    }

    /// Full pass: index every approved-but-unindexed version and remove
    /// every indexed-but-unapproved one. Indexing is idempotent, so each
    /// missing version is indexed at most once per pass and repeated
    /// passes converge to a no-op.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<ReconcileStats, StoreError> {
        let mut stats = ReconcileStats::default();

        let approved = self.store.approved_versions().await?;
        for version in &approved {
            let already = self
                .index
                .contains(&version.entity_id, &version.version_id)
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            if already {
                continue;
            }
            match self
                .index
                .index(
                    &version.entity_id,
                    &version.version_id,
                    &version.content.text_bundle(),
                )
                .await
            {
                Ok(()) => stats.indexed += 1,
                Err(e) => {
                    warn!(
                        version_id = %version.version_id,
                        error = %e,
                        "failed to index approved version, will retry next pass"
                    );
                    stats.failed += 1;
                }
            }
        }

        for (entity_id, version_id) in self
            .index
            .indexed_pairs()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?
        {
            if self.store.is_version_approved(&version_id).await? {
                continue;
            }
            let removed = self
                .index
                .remove(&entity_id, &version_id)
                .await
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            if removed {
                stats.removed += 1;
            }
        }

        info!(
            indexed = stats.indexed,
            removed = stats.removed,
            failed = stats.failed,
            "reconciliation pass complete"
        );
        Ok(stats)
    }

    /// Process pending outbox obligations without a full scan.
    ///
    /// Obligations whose version is no longer approved are dropped;
    /// failed indexing attempts are requeued for the next drive.
    #[instrument(skip(self))]
    pub async fn drive_outbox(&self) -> Result<ReconcileStats, StoreError> {
        let mut stats = ReconcileStats::default();
        let outbox = self.store.outbox();

        for obligation in outbox.drain().await {
            if !self.store.is_version_approved(&obligation.version_id).await? {
                continue;
            }
            let version = self.store.get_version(&obligation.version_id).await?;
            match self
                .index
                .index(
                    &obligation.entity_id,
                    &obligation.version_id,
                    &version.content.text_bundle(),
                )
                .await
            {
                Ok(()) => stats.indexed += 1,
                Err(e) => {
                    warn!(
                        version_id = %obligation.version_id,
                        error = %e,
                        "indexing obligation failed, requeueing"
                    );
                    outbox.requeue(obligation).await;
                    stats.failed += 1;
                }
            }
        }
        Ok(stats)
    }
}
