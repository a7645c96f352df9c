//! # capbot-embeddings
//!
//! Embedding generation for capbot duplicate detection.
//!
//! Maps free text to fixed-dimension numeric vectors. The provider is a
//! swappable async seam; the default implementation is a deterministic
//! in-process token-hashing embedder that needs no model files or network,
//! which keeps similarity decisions reproducible in tests and development.

pub mod error;
pub mod hashing;
pub mod provider;

pub use error::EmbeddingError;
pub use hashing::HashEmbedder;
pub use provider::{Embedding, EmbeddingProvider};
