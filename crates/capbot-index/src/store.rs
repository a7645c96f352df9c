//! Vector storage backend trait and in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::IndexError;

/// Embedding vector persisted for one approved version.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityRecord {
    /// Entity owning the version
    pub entity_id: String,

    /// Indexed version
    pub version_id: String,

    /// Normalized embedding vector
    pub vector: Vec<f32>,

    /// When the record was first indexed; used as the query tie-breaker
    pub indexed_at: DateTime<Utc>,
}

impl SimilarityRecord {
    /// Composite key for this record.
    pub fn key(&self) -> (String, String) {
        (self.entity_id.clone(), self.version_id.clone())
    }
}

/// Trait for durable vector storage.
///
/// Accessed only through the similarity index; implementations must be
/// safe under concurrent access.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Fetch a record by (entity, version) key.
    async fn get(&self, entity_id: &str, version_id: &str)
        -> Result<Option<SimilarityRecord>, IndexError>;

    /// Insert or replace a record.
    async fn upsert(&self, record: SimilarityRecord) -> Result<(), IndexError>;

    /// Remove a record. Returns whether it existed.
    async fn remove(&self, entity_id: &str, version_id: &str) -> Result<bool, IndexError>;

    /// All stored records.
    async fn list(&self) -> Result<Vec<SimilarityRecord>, IndexError>;

    /// Number of stored records.
    async fn len(&self) -> Result<usize, IndexError>;
}

/// In-memory vector store backed by a read-write locked map.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<(String, String), SimilarityRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn get(
        &self,
        entity_id: &str,
        version_id: &str,
    ) -> Result<Option<SimilarityRecord>, IndexError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(entity_id.to_string(), version_id.to_string()))
            .cloned())
    }

    async fn upsert(&self, record: SimilarityRecord) -> Result<(), IndexError> {
        let mut records = self.records.write().await;
        records.insert(record.key(), record);
        Ok(())
    }

    async fn remove(&self, entity_id: &str, version_id: &str) -> Result<bool, IndexError> {
        let mut records = self.records.write().await;
        Ok(records
            .remove(&(entity_id.to_string(), version_id.to_string()))
            .is_some())
    }

    async fn list(&self) -> Result<Vec<SimilarityRecord>, IndexError> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn len(&self) -> Result<usize, IndexError> {
        let records = self.records.read().await;
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(entity: &str, version: &str) -> SimilarityRecord {
        SimilarityRecord {
            entity_id: entity.to_string(),
            version_id: version.to_string(),
            vector: vec![1.0, 0.0],
            indexed_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = InMemoryVectorStore::new();
        store.upsert(record("e1", "v1")).await.unwrap();
        let fetched = store.get("e1", "v1").await.unwrap().unwrap();
        assert_eq!(fetched.entity_id, "e1");
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces() {
        let store = InMemoryVectorStore::new();
        store.upsert(record("e1", "v1")).await.unwrap();
        let mut updated = record("e1", "v1");
        updated.vector = vec![0.0, 1.0];
        store.upsert(updated).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 1);
        let fetched = store.get("e1", "v1").await.unwrap().unwrap();
        assert_eq!(fetched.vector, vec![0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemoryVectorStore::new();
        store.upsert(record("e1", "v1")).await.unwrap();
        assert!(store.remove("e1", "v1").await.unwrap());
        assert!(!store.remove("e1", "v1").await.unwrap());
        assert!(store.get("e1", "v1").await.unwrap().is_none());
    }
}
