//! Semantic routing: map a query to the best-matching enabled plugin.
//!
//! With an embedder configured, the router compares the query embedding
//! against every cached keyword embedding of every enabled plugin and takes
//! the global argmax. The similarity must strictly exceed the cutoff; on a
//! tied maximum the plugin registered first wins, which is deterministic
//! because the registry iterates in registration order.
//!
//! Without an embedder the router degrades to lowercase keyword containment
//! and never produces a numeric score.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::{CoreError, CoreResult};
use crate::plugins::descriptor::PluginEntry;
use crate::plugins::registry::PluginRegistry;
use crate::routing::cache::EmbeddingCache;
use crate::routing::embedding::{cosine_similarity, Embedder};
use crate::types::{MatchReason, MatchScore, Query, RoutingDecision};

pub struct SemanticRouter {
    registry: Arc<PluginRegistry>,
    embedder: Option<Arc<dyn Embedder>>,
    cache: EmbeddingCache,
    similarity_cutoff: f32,
}

impl SemanticRouter {
    pub fn new(
        registry: Arc<PluginRegistry>,
        embedder: Option<Arc<dyn Embedder>>,
        similarity_cutoff: f32,
        cache_size: usize,
    ) -> Self {
        Self {
            registry,
            embedder,
            cache: EmbeddingCache::new(cache_size),
            similarity_cutoff,
        }
    }

    /// Routing has no side effects on plugin state; it only populates the
    /// query-embedding cache and the per-plugin keyword-embedding caches.
    pub async fn route(&self, query: &Query) -> RoutingDecision {
        let entries = self.registry.entries_in_order().await;

        if let Some(embedder) = &self.embedder {
            match self.route_by_embedding(embedder.as_ref(), query, &entries).await {
                Ok(decision) => return decision,
                Err(e) => {
                    warn!("embedding unavailable, degrading to keyword match: {}", e);
                }
            }
        }
        Self::route_by_keyword(query, &entries)
    }

    /// Eagerly computes keyword embeddings for every registered plugin.
    /// Optional; the routing pass populates them lazily otherwise.
    pub async fn warm_embeddings(&self) -> CoreResult<()> {
        if let Some(embedder) = &self.embedder {
            for entry in self.registry.entries_in_order().await {
                self.keyword_embeddings(embedder.as_ref(), &entry).await?;
            }
        }
        Ok(())
    }

    async fn route_by_embedding(
        &self,
        embedder: &dyn Embedder,
        query: &Query,
        entries: &[Arc<PluginEntry>],
    ) -> CoreResult<RoutingDecision> {
        let query_embedding = self.query_embedding(embedder, query.text()).await?;

        let mut best: Option<(&str, f32)> = None;
        for entry in entries {
            if !entry.is_enabled() {
                continue;
            }
            let keyword_embeddings = self.keyword_embeddings(embedder, entry).await?;
            for keyword_embedding in keyword_embeddings.iter() {
                let similarity = cosine_similarity(&query_embedding, keyword_embedding);
                // Strictly greater, so the first plugin to reach the maximum
                // keeps it on ties.
                if best.map_or(true, |(_, s)| similarity > s) {
                    best = Some((entry.name.as_str(), similarity));
                }
            }
        }

        match best {
            Some((name, similarity)) if similarity > self.similarity_cutoff => {
                debug!(plugin = %name, similarity, "embedding match");
                Ok(RoutingDecision {
                    plugin: Some(name.to_string()),
                    score: MatchScore::Similarity(similarity),
                    reason: MatchReason::EmbeddingMatch,
                })
            }
            _ => Ok(RoutingDecision::no_match()),
        }
    }

    /// Degraded mode: lowercase containment of any keyword in the query.
    /// First registered plugin with a containing keyword wins.
    fn route_by_keyword(query: &Query, entries: &[Arc<PluginEntry>]) -> RoutingDecision {
        let haystack = query.text().to_lowercase();
        for entry in entries {
            if !entry.is_enabled() {
                continue;
            }
            let matched = entry
                .keywords
                .iter()
                .any(|keyword| haystack.contains(&keyword.to_lowercase()));
            if matched {
                debug!(plugin = %entry.name, "keyword match");
                return RoutingDecision {
                    plugin: Some(entry.name.clone()),
                    score: MatchScore::Keyword(true),
                    reason: MatchReason::KeywordMatch,
                };
            }
        }
        RoutingDecision::no_match()
    }

    async fn query_embedding(&self, embedder: &dyn Embedder, text: &str) -> CoreResult<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            return Ok(cached);
        }
        let embedding = embedder.embed(text).await.map_err(embed_error)?;
        self.cache.put(text, embedding.clone());
        Ok(embedding)
    }

    /// Keyword embeddings are computed once per plugin and cached in its
    /// registry entry.
    async fn keyword_embeddings(
        &self,
        embedder: &dyn Embedder,
        entry: &PluginEntry,
    ) -> CoreResult<Arc<Vec<Vec<f32>>>> {
        {
            let cached = entry.keyword_embeddings.read().await;
            if let Some(embeddings) = cached.as_ref() {
                return Ok(Arc::clone(embeddings));
            }
        }

        let mut embeddings = Vec::with_capacity(entry.keywords.len());
        for keyword in &entry.keywords {
            embeddings.push(embedder.embed(keyword).await.map_err(embed_error)?);
        }
        let embeddings = Arc::new(embeddings);

        let mut cached = entry.keyword_embeddings.write().await;
        // Another routing pass may have raced us here; either result is
        // identical, so last write wins.
        *cached = Some(Arc::clone(&embeddings));
        Ok(embeddings)
    }
}

/// Failures crossing the `Embedder` seam surface uniformly as
/// `CoreError::Embedding`.
fn embed_error(e: CoreError) -> CoreError {
    match e {
        CoreError::Embedding(_) => e,
        other => CoreError::Embedding(other.to_string()),
    }
}
