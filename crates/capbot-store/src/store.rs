//! Version store: lifecycle operations over topic entities and versions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use capbot_types::{
    IndexObligation, TopicContent, TopicEntity, TopicVersion, VersionStatus,
};

use crate::error::StoreError;
use crate::outbox::IndexOutbox;
use crate::records::RecordStore;

/// Where a new version should be attached.
#[derive(Debug, Clone)]
pub enum VersionTarget {
    /// Create a fresh entity for the first version.
    NewEntity,
    /// Append the next version to an existing entity.
    Existing(String),
}

/// Owns the lifecycle of topic entities and their versions.
///
/// The current-approved pointer of an entity is updated only here, under
/// a per-entity lock, so at most one version per entity is approved at
/// any observation point.
pub struct VersionStore {
    records: Arc<dyn RecordStore>,
    outbox: Arc<IndexOutbox>,
    entity_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl VersionStore {
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self {
            records,
            outbox: Arc::new(IndexOutbox::new()),
            entity_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Outbox of pending indexing obligations emitted by approvals.
    pub fn outbox(&self) -> Arc<IndexOutbox> {
        Arc::clone(&self.outbox)
    }

    /// Exclusive lock for one entity; created lazily on first use.
    async fn entity_lock(&self, entity_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.entity_locks.lock().await;
        Arc::clone(
            locks
                .entry(entity_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Create a new version in `Submitted` state.
    ///
    /// Assigns the next sequence number for the entity. Fails with
    /// `InvalidContent` when required fields are empty or the team size
    /// is outside {4, 5}.
    #[instrument(skip(self, content))]
    pub async fn create_version(
        &self,
        target: VersionTarget,
        content: TopicContent,
    ) -> Result<TopicVersion, StoreError> {
        content.validate()?;

        match target {
            VersionTarget::NewEntity => {
                let entity = TopicEntity::new();
                let version = TopicVersion::new(entity.entity_id.clone(), 1, content);
                self.records.put_entity(entity).await?;
                self.records.put_version(version.clone()).await?;
                info!(
                    entity_id = %version.entity_id,
                    version_id = %version.version_id,
                    "created entity with first version"
                );
                Ok(version)
            }
            VersionTarget::Existing(entity_id) => {
                let lock = self.entity_lock(&entity_id).await;
                let _guard = lock.lock().await;

                if self.records.get_entity(&entity_id).await?.is_none() {
                    return Err(StoreError::NotFound(format!("entity {}", entity_id)));
                }
                let existing = self.records.versions_for_entity(&entity_id).await?;
                let sequence = existing.last().map(|v| v.sequence + 1).unwrap_or(1);

                let version = TopicVersion::new(entity_id, sequence, content);
                self.records.put_version(version.clone()).await?;
                info!(
                    entity_id = %version.entity_id,
                    version_id = %version.version_id,
                    sequence,
                    "created version"
                );
                Ok(version)
            }
        }
    }

    /// Approve a submitted version and emit an indexing obligation.
    ///
    /// Fails with `InvalidTransition` when the version is not currently
    /// `Submitted` or the entity already holds an approved version (use
    /// [`VersionStore::supersede`] to replace an approval).
    #[instrument(skip(self))]
    pub async fn approve(
        &self,
        version_id: &str,
        reviewer: &str,
    ) -> Result<TopicVersion, StoreError> {
        self.decide_approval(version_id, reviewer, false).await
    }

    /// Approve a submitted version, superseding the entity's current
    /// approved version if one exists. The superseded version keeps its
    /// historical record but leaves the Approved set, so the detector
    /// stops considering it and reconciliation un-indexes it.
    #[instrument(skip(self))]
    pub async fn supersede(
        &self,
        version_id: &str,
        reviewer: &str,
    ) -> Result<TopicVersion, StoreError> {
        self.decide_approval(version_id, reviewer, true).await
    }

    async fn decide_approval(
        &self,
        version_id: &str,
        reviewer: &str,
        allow_supersede: bool,
    ) -> Result<TopicVersion, StoreError> {
        let version = self
            .records
            .get_version(version_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version_id)))?;

        let lock = self.entity_lock(&version.entity_id).await;
        let _guard = lock.lock().await;

        // Re-read under the lock; a sibling approval may have raced us.
        let mut version = self
            .records
            .get_version(version_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version_id)))?;

        if version.status != VersionStatus::Submitted {
            return Err(StoreError::InvalidTransition(format!(
                "version {} is {:?}, expected Submitted",
                version_id, version.status
            )));
        }

        let mut entity = self
            .records
            .get_entity(&version.entity_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("entity {}", version.entity_id)))?;

        if let Some(prev_id) = entity.current_approved_version.clone() {
            if !allow_supersede {
                return Err(StoreError::InvalidTransition(format!(
                    "entity {} already has approved version {}",
                    entity.entity_id, prev_id
                )));
            }
            if let Some(mut prev) = self.records.get_version(&prev_id).await? {
                prev.status = VersionStatus::Superseded;
                prev.decided_at = Some(Utc::now());
                prev.decision_reason = Some(format!("superseded by {}", version_id));
                self.records.put_version(prev).await?;
            }
        }

        version.status = VersionStatus::Approved;
        version.decided_at = Some(Utc::now());
        version.decided_by = Some(reviewer.to_string());
        self.records.put_version(version.clone()).await?;

        entity.current_approved_version = Some(version.version_id.clone());
        self.records.put_entity(entity).await?;

        // At-least-once emission: the obligation is queued before we
        // return, and the reconciler re-derives missed ones from the
        // approved-vs-indexed diff.
        self.outbox
            .enqueue(IndexObligation::new(
                version.entity_id.clone(),
                version.version_id.clone(),
            ))
            .await;

        info!(
            entity_id = %version.entity_id,
            version_id = %version.version_id,
            reviewer,
            "approved version"
        );
        Ok(version)
    }

    /// Reject a submitted version. Terminal for the version; a new
    /// version may be created under the same entity.
    #[instrument(skip(self, reason))]
    pub async fn reject(
        &self,
        version_id: &str,
        reason: Option<String>,
    ) -> Result<TopicVersion, StoreError> {
        let version = self
            .records
            .get_version(version_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version_id)))?;

        let lock = self.entity_lock(&version.entity_id).await;
        let _guard = lock.lock().await;

        let mut version = self
            .records
            .get_version(version_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version_id)))?;

        if version.status != VersionStatus::Submitted {
            return Err(StoreError::InvalidTransition(format!(
                "version {} is {:?}, expected Submitted",
                version_id, version.status
            )));
        }

        version.status = VersionStatus::Rejected;
        version.decided_at = Some(Utc::now());
        version.decision_reason = reason;
        self.records.put_version(version.clone()).await?;

        info!(version_id = %version.version_id, "rejected version");
        Ok(version)
    }

    /// Fetch a version by id.
    pub async fn get_version(&self, version_id: &str) -> Result<TopicVersion, StoreError> {
        self.records
            .get_version(version_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("version {}", version_id)))
    }

    /// The entity's currently approved version, if any.
    pub async fn get_current_approved(
        &self,
        entity_id: &str,
    ) -> Result<Option<TopicVersion>, StoreError> {
        let entity = self
            .records
            .get_entity(entity_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("entity {}", entity_id)))?;
        match entity.current_approved_version {
            Some(version_id) => Ok(self.records.get_version(&version_id).await?),
            None => Ok(None),
        }
    }

    /// Liveness check for the duplicate detector: is this version
    /// Approved right now? Unknown versions are simply not approved.
    pub async fn is_version_approved(&self, version_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .records
            .get_version(version_id)
            .await?
            .map(|v| v.status == VersionStatus::Approved)
            .unwrap_or(false))
    }

    /// All currently approved versions, for reconciliation.
    pub async fn approved_versions(&self) -> Result<Vec<TopicVersion>, StoreError> {
        let versions = self.records.list_versions().await?;
        Ok(versions
            .into_iter()
            .filter(|v| v.status == VersionStatus::Approved)
            .collect())
    }
}
