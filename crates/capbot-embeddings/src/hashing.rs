//! Deterministic token-hashing embedder.
//!
//! Feature-hashing over lowercased word tokens: each token is FNV-1a
//! hashed into one of `dimension` buckets with an alternating sign, and
//! the accumulated vector is normalized. Identical input always yields an
//! identical vector; texts with disjoint token sets land near-orthogonal.
//! No model files, no network, no tokenizer downloads.

use async_trait::async_trait;
use tracing::trace;

use crate::error::EmbeddingError;
use crate::provider::{Embedding, EmbeddingProvider};

/// Default embedding dimension for the hashing embedder.
pub const DEFAULT_DIMENSION: usize = 256;

/// Deterministic in-process embedding provider.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    /// Create an embedder with the default dimension.
    pub fn new() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Create an embedder with a custom dimension (minimum 8).
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(8),
        }
    }

    fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1)
            .map(|t| t.to_lowercase())
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

/// FNV-1a 64-bit hash. Stable across platforms and compiler versions, so
/// embeddings are reproducible for a given provider version.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut values = vec![0.0f32; self.dimension];
        let mut token_count = 0usize;

        for token in Self::tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dimension as u64) as usize;
            // Top hash bit decides the sign, spreading collisions.
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            values[bucket] += sign;
            token_count += 1;
        }

        if token_count == 0 {
            return Err(EmbeddingError::EmptyInput);
        }

        trace!(tokens = token_count, dimension = self.dimension, "embedded text");
        Ok(Embedding::new(values))
    }
}
