//! In-process outbox of pending indexing obligations.
//!
//! Approval pushes an obligation here before returning, so the indexing
//! side effect survives a failed or cancelled index call: anything left in
//! the outbox (or missed entirely) is picked up by the reconciler.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use capbot_types::IndexObligation;

/// FIFO queue of versions awaiting indexing.
#[derive(Debug, Default)]
pub struct IndexOutbox {
    entries: Mutex<VecDeque<IndexObligation>>,
}

impl IndexOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an obligation. Duplicates are allowed; indexing is
    /// idempotent so processing one twice is harmless.
    pub async fn enqueue(&self, obligation: IndexObligation) {
        self.entries.lock().await.push_back(obligation);
    }

    /// Take all pending obligations, leaving the outbox empty.
    pub async fn drain(&self) -> Vec<IndexObligation> {
        self.entries.lock().await.drain(..).collect()
    }

    /// Put an obligation back after a failed indexing attempt.
    pub async fn requeue(&self, obligation: IndexObligation) {
        self.entries.lock().await.push_front(obligation);
    }

    /// Number of pending obligations.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the outbox is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_enqueue_drain() {
        let outbox = IndexOutbox::new();
        assert!(outbox.is_empty().await);

        outbox.enqueue(IndexObligation::new("e1", "v1")).await;
        outbox.enqueue(IndexObligation::new("e2", "v2")).await;
        assert_eq!(outbox.len().await, 2);

        let drained = outbox.drain().await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].version_id, "v1");
        assert!(outbox.is_empty().await);
    }

    #[tokio::test]
    async fn test_requeue_preserves_order() {
        let outbox = IndexOutbox::new();
        outbox.enqueue(IndexObligation::new("e2", "v2")).await;
        outbox.requeue(IndexObligation::new("e1", "v1")).await;

        let drained = outbox.drain().await;
        assert_eq!(drained[0].version_id, "v1");
        assert_eq!(drained[1].version_id, "v2");
    }
}
