//! # capbot-store
//!
//! Version store for topic entities: owns the lifecycle of topic versions
//! (create, approve, supersede, reject) and is the source of truth for
//! what is approved and therefore indexable.
//!
//! Approval and indexing are two independently-failable steps. Approval
//! enqueues an indexing obligation into an outbox; the reconciler aligns
//! the approved set with the indexed set so a crash between the two steps
//! leaves only the repairable approved-but-unindexed state.

pub mod error;
pub mod outbox;
pub mod reconcile;
pub mod records;
pub mod store;

pub use error::StoreError;
pub use outbox::IndexOutbox;
pub use reconcile::{ReconcileStats, Reconciler};
pub use records::{InMemoryRecordStore, RecordStore};
pub use store::{VersionStore, VersionTarget};
