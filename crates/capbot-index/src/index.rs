//! Similarity index operations: idempotent upsert, ordered query, removal.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, instrument, warn};

use capbot_embeddings::{Embedding, EmbeddingProvider};
use capbot_types::TopicMatch;

use crate::error::IndexError;
use crate::store::{SimilarityRecord, VectorStore};

/// Similarity index over approved topic versions.
///
/// Wraps an embedding provider and a vector storage backend. Indexing is
/// idempotent and queries return a stable, reproducible ordering.
pub struct SimilarityIndex {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl SimilarityIndex {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { provider, store }
    }

    /// Index a text bundle under (entity, version).
    ///
    /// Idempotent: re-indexing the same version with an identical vector
    /// keeps the original record, including its `indexed_at` tie-breaker,
    /// so query results are unchanged.
    #[instrument(skip(self, bundle), fields(entity_id, version_id))]
    pub async fn index(
        &self,
        entity_id: &str,
        version_id: &str,
        bundle: &str,
    ) -> Result<(), IndexError> {
        let embedding = self.provider.embed(bundle).await?;

        if let Some(existing) = self.store.get(entity_id, version_id).await? {
            if existing.vector == embedding.values {
                debug!(entity_id, version_id, "version already indexed, skipping");
                return Ok(());
            }
            warn!(
                entity_id,
                version_id, "re-indexing version with changed content"
            );
        }

        self.store
            .upsert(SimilarityRecord {
                entity_id: entity_id.to_string(),
                version_id: version_id.to_string(),
                vector: embedding.values,
                indexed_at: Utc::now(),
            })
            .await?;
        debug!(entity_id, version_id, "indexed version");
        Ok(())
    }

    /// Query the index with a text bundle.
    ///
    /// Returns up to `top_k` matches ordered by descending score; ties are
    /// broken by earlier index time so ordering is reproducible.
    /// `excluded_entity_id` lets a version under revision skip comparison
    /// against its own history.
    pub async fn query(
        &self,
        bundle: &str,
        top_k: usize,
        excluded_entity_id: Option<&str>,
    ) -> Result<Vec<TopicMatch>, IndexError> {
        let query = self.provider.embed(bundle).await?;
        let records = self.store.list().await?;

        let mut scored: Vec<(TopicMatch, chrono::DateTime<Utc>)> = Vec::new();
        for record in records {
            if excluded_entity_id == Some(record.entity_id.as_str()) {
                continue;
            }
            let stored = Embedding::from_normalized(record.vector.clone());
            let score = query.similarity_score(&stored);
            scored.push((
                TopicMatch {
                    entity_id: record.entity_id,
                    version_id: record.version_id,
                    score,
                },
                record.indexed_at,
            ));
        }

        scored.sort_by(|(a, a_at), (b, b_at)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a_at.cmp(b_at))
                .then_with(|| a.version_id.cmp(&b.version_id))
        });
        scored.truncate(top_k);

        Ok(scored.into_iter().map(|(m, _)| m).collect())
    }

    /// Remove a record, used when reconciliation finds an indexed version
    /// whose approval was revoked.
    pub async fn remove(&self, entity_id: &str, version_id: &str) -> Result<bool, IndexError> {
        let removed = self.store.remove(entity_id, version_id).await?;
        if removed {
            debug!(entity_id, version_id, "removed version from index");
        }
        Ok(removed)
    }

    /// Whether a (entity, version) pair is currently indexed.
    pub async fn contains(&self, entity_id: &str, version_id: &str) -> Result<bool, IndexError> {
        Ok(self.store.get(entity_id, version_id).await?.is_some())
    }

    /// All indexed (entity id, version id) pairs, for reconciliation.
    pub async fn indexed_pairs(&self) -> Result<Vec<(String, String)>, IndexError> {
        let records = self.store.list().await?;
        Ok(records
            .into_iter()
            .map(|r| (r.entity_id, r.version_id))
            .collect())
    }

    /// Number of indexed versions.
    pub async fn len(&self) -> Result<usize, IndexError> {
        self.store.len().await
    }
}
