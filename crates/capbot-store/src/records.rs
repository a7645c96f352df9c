//! Record storage backend trait and in-memory implementation.
//!
//! Durable storage for topic entities and versions, accessed only through
//! the version store's operation contract.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use capbot_types::{TopicEntity, TopicVersion};

use crate::error::StoreError;

/// Trait for durable entity/version record storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch an entity by id.
    async fn get_entity(&self, entity_id: &str) -> Result<Option<TopicEntity>, StoreError>;

    /// Insert or replace an entity record.
    async fn put_entity(&self, entity: TopicEntity) -> Result<(), StoreError>;

    /// Fetch a version by id.
    async fn get_version(&self, version_id: &str) -> Result<Option<TopicVersion>, StoreError>;

    /// Insert or replace a version record.
    async fn put_version(&self, version: TopicVersion) -> Result<(), StoreError>;

    /// All versions belonging to an entity.
    async fn versions_for_entity(&self, entity_id: &str)
        -> Result<Vec<TopicVersion>, StoreError>;

    /// All version records.
    async fn list_versions(&self) -> Result<Vec<TopicVersion>, StoreError>;
}

/// In-memory record store backed by read-write locked maps.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    entities: RwLock<HashMap<String, TopicEntity>>,
    versions: RwLock<HashMap<String, TopicVersion>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_entity(&self, entity_id: &str) -> Result<Option<TopicEntity>, StoreError> {
        Ok(self.entities.read().await.get(entity_id).cloned())
    }

    async fn put_entity(&self, entity: TopicEntity) -> Result<(), StoreError> {
        self.entities
            .write()
            .await
            .insert(entity.entity_id.clone(), entity);
        Ok(())
    }

    async fn get_version(&self, version_id: &str) -> Result<Option<TopicVersion>, StoreError> {
        Ok(self.versions.read().await.get(version_id).cloned())
    }

    async fn put_version(&self, version: TopicVersion) -> Result<(), StoreError> {
        self.versions
            .write()
            .await
            .insert(version.version_id.clone(), version);
        Ok(())
    }

    async fn versions_for_entity(
        &self,
        entity_id: &str,
    ) -> Result<Vec<TopicVersion>, StoreError> {
        let versions = self.versions.read().await;
        let mut matching: Vec<TopicVersion> = versions
            .values()
            .filter(|v| v.entity_id == entity_id)
            .cloned()
            .collect();
        matching.sort_by_key(|v| v.sequence);
        Ok(matching)
    }

    async fn list_versions(&self) -> Result<Vec<TopicVersion>, StoreError> {
        Ok(self.versions.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capbot_types::TopicContent;

    fn content() -> TopicContent {
        TopicContent {
            en_title: "Test Topic".to_string(),
            vn_title: "Đề tài thử nghiệm".to_string(),
            abbreviation: "TT".to_string(),
            problem: "A problem".to_string(),
            context: "A context".to_string(),
            content: "Some content".to_string(),
            description: "A description".to_string(),
            objectives: "Some objectives".to_string(),
            category: "General".to_string(),
            team_size: 4,
            suggested_roles: TopicContent::default_roles(4),
        }
    }

    #[tokio::test]
    async fn test_entity_roundtrip() {
        let store = InMemoryRecordStore::new();
        let entity = TopicEntity::new();
        let id = entity.entity_id.clone();
        store.put_entity(entity).await.unwrap();
        assert!(store.get_entity(&id).await.unwrap().is_some());
        assert!(store.get_entity("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_versions_for_entity_sorted() {
        let store = InMemoryRecordStore::new();
        store
            .put_version(TopicVersion::new("e1", 2, content()))
            .await
            .unwrap();
        store
            .put_version(TopicVersion::new("e1", 1, content()))
            .await
            .unwrap();
        store
            .put_version(TopicVersion::new("e2", 1, content()))
            .await
            .unwrap();

        let versions = store.versions_for_entity("e1").await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].sequence, 1);
        assert_eq!(versions[1].sequence, 2);
    }
}
