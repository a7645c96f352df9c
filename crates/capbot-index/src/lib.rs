//! # capbot-index
//!
//! Similarity index over approved topic versions.
//!
//! Stores embedding vectors keyed by (entity id, version id) and answers
//! nearest-neighbour queries with a [0, 1] similarity score. Only versions
//! approved by the version store are ever indexed; staleness (an approval
//! revoked after indexing) is tolerated here and resolved by the duplicate
//! detector's liveness check and the reconciliation pass.

pub mod error;
pub mod index;
pub mod store;

pub use error::IndexError;
pub use index::SimilarityIndex;
pub use store::{InMemoryVectorStore, SimilarityRecord, VectorStore};
