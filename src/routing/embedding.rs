//! Embedding abstraction used by the semantic router.
//!
//! The embedding model itself is an opaque service behind the `Embedder`
//! trait. `HashEmbedder` is a deterministic, dependency-free implementation
//! suitable for tests and for environments without a real model; routing
//! falls back to keyword containment when no embedder is configured at all.

use async_trait::async_trait;

use crate::errors::CoreResult;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimension of the vectors this embedder produces.
    fn dimension(&self) -> usize;

    /// Embed a piece of text into a fixed-length vector.
    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>>;
}

/// Cosine similarity between two vectors. Mismatched lengths and zero
/// vectors score 0.0 rather than erroring.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        0.0
    } else {
        dot_product / (magnitude_a * magnitude_b)
    }
}

/// Deterministic hash-based embedder. Identical text always maps to the
/// same unit-length vector, which is all the router's cache and tie-break
/// tests need.
#[derive(Debug)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.to_lowercase().hash(&mut hasher);
        let hash = hasher.finish();

        let mut embedding = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            let seed = hash.wrapping_add(i as u64);
            let mut local_hasher = DefaultHasher::new();
            seed.hash(&mut local_hasher);
            let value = local_hasher.finish() as f32 / u64::MAX as f32;
            embedding.push(value);
        }

        normalize(&mut embedding);
        embedding
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        Ok(self.generate(text))
    }
}

fn normalize(vector: &mut [f32]) {
    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for value in vector.iter_mut() {
            *value /= magnitude;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed("hello world").await.unwrap();
        let b = embedder.embed("hello world").await.unwrap();
        let c = embedder.embed("different text").await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let magnitude: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }
}
