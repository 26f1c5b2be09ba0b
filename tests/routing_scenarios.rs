//! Integration tests for semantic routing: tie-breaks, the confidence
//! boundary, degraded keyword mode, and interaction with auto-disable.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use concierge::{
    Assistant, CoreResult, Embedder, ExecStatus, MatchReason, MatchScore, Plugin, RuntimeConfig,
    SourceTag,
};

/// Embedder with a fixed text-to-vector table, so similarity scores in tests
/// are exact and reproducible.
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(rows: &[(&str, &[f32])]) -> Self {
        Self {
            table: rows
                .iter()
                .map(|(text, v)| (text.to_string(), v.to_vec()))
                .collect(),
        }
    }
}

#[async_trait]
impl Embedder for TableEmbedder {
    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        Ok(self
            .table
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0, 0.0]))
    }
}

/// Embedder whose backing service is unreachable.
struct DownEmbedder;

#[async_trait]
impl Embedder for DownEmbedder {
    fn dimension(&self) -> usize {
        2
    }

    async fn embed(&self, _text: &str) -> CoreResult<Vec<f32>> {
        Err(concierge::CoreError::Embedding(
            "embedding service is down".to_string(),
        ))
    }
}

struct KeywordPlugin {
    name: &'static str,
    keywords: Vec<String>,
    healthy: Arc<AtomicBool>,
}

impl KeywordPlugin {
    fn new(name: &'static str, keywords: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            name,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            healthy: Arc::new(AtomicBool::new(true)),
        })
    }

    fn failing(name: &'static str, keywords: &[&str]) -> Arc<Self> {
        let plugin = Self::new(name, keywords);
        plugin.healthy.store(false, Ordering::SeqCst);
        plugin
    }
}

#[async_trait]
impl Plugin for KeywordPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn keywords(&self) -> Vec<String> {
        self.keywords.clone()
    }

    async fn run(&self, query: &str) -> CoreResult<Value> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(json!({ "handled_by": self.name, "query": query }))
        } else {
            Err(concierge::CoreError::PluginCrash {
                name: self.name.to_string(),
                detail: "synthetic failure".to_string(),
            })
        }
    }
}

fn config() -> RuntimeConfig {
    RuntimeConfig::default()
}

#[tokio::test]
async fn test_tie_break_prefers_registration_order() {
    // Both plugins' keywords embed to the identical vector, so both score
    // the same maximum similarity against the query.
    let embedder = TableEmbedder::new(&[
        ("ping", &[1.0, 0.0]),
        ("alpha sync", &[1.0, 0.0]),
        ("beta sync", &[1.0, 0.0]),
    ]);
    let assistant = Assistant::builder(config())
        .with_embedder(Arc::new(embedder))
        .build()
        .unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("alpha", &["alpha sync"]))
        .await
        .unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("beta", &["beta sync"]))
        .await
        .unwrap();

    for _ in 0..10 {
        let decision = assistant.route("ping").await.unwrap();
        assert_eq!(decision.plugin.as_deref(), Some("alpha"));
        assert_eq!(decision.reason, MatchReason::EmbeddingMatch);
    }
}

#[tokio::test]
async fn test_score_must_strictly_exceed_cutoff() {
    // query=[4,3], keyword=[3,4]: cosine is exactly 24/25 = 0.96 in f32.
    let embedder = || {
        TableEmbedder::new(&[("the query", &[4.0, 3.0]), ("the keyword", &[3.0, 4.0])])
    };

    let mut at_cutoff = config();
    at_cutoff.similarity_cutoff = 0.96;
    let assistant = Assistant::builder(at_cutoff)
        .with_embedder(Arc::new(embedder()))
        .build()
        .unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("exact", &["the keyword"]))
        .await
        .unwrap();
    let decision = assistant.route("the query").await.unwrap();
    assert_eq!(decision.plugin, None, "score equal to cutoff must not select");
    assert_eq!(decision.reason, MatchReason::NoMatch);

    let mut below_cutoff = config();
    below_cutoff.similarity_cutoff = 0.9599;
    let assistant = Assistant::builder(below_cutoff)
        .with_embedder(Arc::new(embedder()))
        .build()
        .unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("exact", &["the keyword"]))
        .await
        .unwrap();
    let decision = assistant.route("the query").await.unwrap();
    assert_eq!(decision.plugin.as_deref(), Some("exact"));
    match decision.score {
        MatchScore::Similarity(s) => assert!(s > 0.9599 && s <= 0.9600001),
        other => panic!("expected similarity score, got {:?}", other),
    }
}

#[tokio::test]
async fn test_keyword_containment_routes_weather_not_stocks() {
    // No embedder configured: degraded keyword-containment mode.
    let assistant = Assistant::builder(config()).build().unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("weather", &["weather", "forecast"]))
        .await
        .unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("stocks", &["stock", "ticker"]))
        .await
        .unwrap();

    let decision = assistant.route("what's the forecast today").await.unwrap();
    assert_eq!(decision.plugin.as_deref(), Some("weather"));
    assert_eq!(decision.reason, MatchReason::KeywordMatch);
    assert_eq!(decision.score, MatchScore::Keyword(true));

    let result = assistant
        .handle_query("what's the forecast today", None)
        .await
        .unwrap();
    assert_eq!(result.status, ExecStatus::Success);
    assert_eq!(result.source, SourceTag::Plugin("weather".to_string()));
}

#[tokio::test]
async fn test_embedder_failure_degrades_to_keyword_routing() {
    // The embedder is configured but every call fails; routing must fall
    // back to keyword containment instead of surfacing the error.
    let assistant = Assistant::builder(config())
        .with_embedder(Arc::new(DownEmbedder))
        .build()
        .unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("weather", &["weather", "forecast"]))
        .await
        .unwrap();

    let decision = assistant.route("what's the forecast today").await.unwrap();
    assert_eq!(decision.plugin.as_deref(), Some("weather"));
    assert_eq!(decision.reason, MatchReason::KeywordMatch);

    let result = assistant
        .handle_query("what's the forecast today", None)
        .await
        .unwrap();
    assert_eq!(result.source, SourceTag::Plugin("weather".to_string()));
}

#[tokio::test]
async fn test_auto_disabled_plugin_is_never_routed_even_at_perfect_score() {
    let embedder = TableEmbedder::new(&[("crash now", &[1.0, 0.0])]);
    let assistant = Assistant::builder(config())
        .with_embedder(Arc::new(embedder))
        .build()
        .unwrap();
    let plugin = KeywordPlugin::failing("crasher", &["crash now"]);
    assistant.register_plugin(plugin.clone()).await.unwrap();

    // Perfect similarity: the query text equals the keyword.
    for _ in 0..3 {
        let result = assistant.handle_query("crash now", None).await.unwrap();
        // The plugin stage fails and the (empty) cascade answers instead.
        assert_eq!(result.source, SourceTag::FallbackMessage);
    }

    let plugins = assistant.list_plugins().await;
    assert!(!plugins[0].enabled);

    // Still a perfect score, but the disabled plugin is invisible to routing.
    let decision = assistant.route("crash now").await.unwrap();
    assert_eq!(decision.plugin, None);
    assert_eq!(decision.reason, MatchReason::NoMatch);
}

#[tokio::test]
async fn test_restart_makes_plugin_routable_again() {
    let assistant = Assistant::builder(config()).build().unwrap();
    let plugin = KeywordPlugin::failing("weather", &["weather"]);
    assistant.register_plugin(plugin.clone()).await.unwrap();

    for _ in 0..3 {
        assistant
            .handle_query("how is the weather", None)
            .await
            .unwrap();
    }
    let descriptor = &assistant.list_plugins().await[0];
    assert!(!descriptor.enabled);
    assert_eq!(descriptor.consecutive_failures, 3);

    // Heal the plugin body, then restart the descriptor.
    plugin.healthy.store(true, Ordering::SeqCst);
    assistant.restart_plugin("weather").await.unwrap();

    let descriptor = &assistant.list_plugins().await[0];
    assert!(descriptor.enabled);
    assert_eq!(descriptor.consecutive_failures, 0);

    let result = assistant
        .handle_query("how is the weather", None)
        .await
        .unwrap();
    assert_eq!(result.status, ExecStatus::Success);
    assert_eq!(result.source, SourceTag::Plugin("weather".to_string()));
}

#[tokio::test]
async fn test_plugin_without_keywords_is_unreachable_by_routing() {
    let assistant = Assistant::builder(config()).build().unwrap();
    assistant
        .register_plugin(KeywordPlugin::new("silent", &[]))
        .await
        .unwrap();

    let decision = assistant.route("silent please").await.unwrap();
    assert_eq!(decision.plugin, None);

    // Still reachable through direct execution.
    let result = assistant.run_plugin("silent", "direct call").await.unwrap();
    assert_eq!(result.status, ExecStatus::Success);
}
