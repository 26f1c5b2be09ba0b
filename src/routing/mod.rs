//! Semantic routing: embeddings, similarity, and the routing decision.

pub mod cache;
pub mod embedding;
pub mod router;

pub use cache::EmbeddingCache;
pub use embedding::{cosine_similarity, Embedder, HashEmbedder};
pub use router::SemanticRouter;
