//! Embedding provider trait and vector type.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Unit-length embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Vector components, normalized to unit length at construction
    pub values: Vec<f32>,
}

impl Embedding {
    /// Build an embedding, scaling the vector to unit length. A zero
    /// vector stays zero and scores 0.5 against everything.
    pub fn new(mut values: Vec<f32>) -> Self {
        let norm = values.iter().fold(0.0f32, |acc, x| acc + x * x).sqrt();
        if norm > 0.0 {
            for value in &mut values {
                *value /= norm;
            }
        }
        Self { values }
    }

    /// Wrap a vector that is already unit length, e.g. one read back
    /// from the vector store.
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity with another embedding, in [-1, 1]. Both sides
    /// are unit length, so this is the plain dot product; mismatched
    /// dimensions compare as orthogonal.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension() != other.dimension() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }

    /// Cosine similarity rescaled to [0, 1], the score space used by the
    /// duplicate detector (1 = identical, ~0.5 = unrelated).
    pub fn similarity_score(&self, other: &Embedding) -> f32 {
        ((self.cosine_similarity(other) + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}

/// Trait for embedding providers.
///
/// Implementations must be thread-safe and deterministic for identical
/// input within one provider version. Calls are suspension points: a slow
/// or remote backend must not block unrelated pipeline runs.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding dimension produced by this provider.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn test_construction_scales_to_unit_length() {
        let emb = Embedding::new(vec![3.0, 4.0]);
        assert!(close(emb.values[0], 0.6) && close(emb.values[1], 0.8));
        // Zero vectors pass through untouched.
        assert_eq!(Embedding::new(vec![0.0, 0.0]).values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_score_space() {
        let right = Embedding::new(vec![2.0, 0.0]);
        let up = Embedding::new(vec![0.0, 5.0]);
        let left = Embedding::new(vec![-1.0, 0.0]);

        // Identical = 1, orthogonal = 0.5, opposite = 0.
        assert!(close(right.similarity_score(&right.clone()), 1.0));
        assert!(close(right.similarity_score(&up), 0.5));
        assert!(close(right.similarity_score(&left), 0.0));
    }

    #[test]
    fn test_mismatched_dimensions_score_as_unrelated() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert!(close(a.cosine_similarity(&b), 0.0));
        assert!(close(a.similarity_score(&b), 0.5));
    }
}
