//! Top-level runtime handle: wires the registry, router, executor and
//! cascade together and drives the per-query control flow.
//!
//! Control flow per query: route; on a confident match execute the selected
//! plugin in the sandbox; on anything other than success, or on no match at
//! all, hand the query to the fallback cascade. The caller always receives
//! an `ExecutionResult` whose source tag states where the answer came from.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::errors::CoreResult;
use crate::fallback::cascade::FallbackCascade;
use crate::fallback::local::GenerativeModel;
use crate::fallback::remote::RemoteReasoningClient;
use crate::health::{HealthMonitor, HealthReport};
use crate::plugins::contract::{Plugin, ProbeReport};
use crate::plugins::descriptor::PluginDescriptor;
use crate::plugins::executor::SandboxedExecutor;
use crate::plugins::registry::PluginRegistry;
use crate::routing::embedding::Embedder;
use crate::routing::router::SemanticRouter;
use crate::types::{ExecutionResult, Query, RoutingDecision};

pub struct AssistantBuilder {
    config: RuntimeConfig,
    embedder: Option<Arc<dyn Embedder>>,
    local_model: Option<Arc<dyn GenerativeModel>>,
}

impl AssistantBuilder {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            embedder: None,
            local_model: None,
        }
    }

    /// Embedding backend for semantic routing. Without one the router runs
    /// in keyword-containment mode.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// The single shared local model instance for the cascade's third stage.
    pub fn with_local_model(mut self, model: Arc<dyn GenerativeModel>) -> Self {
        self.local_model = Some(model);
        self
    }

    pub fn build(self) -> CoreResult<Assistant> {
        self.config.validate()?;

        // An explicitly supplied model wins over the configured path.
        let local_model = match (self.local_model, &self.config.local_model_path) {
            (Some(model), _) => Some(model),
            (None, Some(path)) => {
                #[cfg(feature = "llm")]
                {
                    Some(Arc::new(crate::fallback::local::LocalLlamaModel::new(path.clone()))
                        as Arc<dyn GenerativeModel>)
                }
                #[cfg(not(feature = "llm"))]
                {
                    warn!(
                        path = %path,
                        "local_model_path is set but the `llm` feature is disabled, \
                         skipping the local model stage"
                    );
                    None
                }
            }
            (None, None) => None,
        };

        let registry = Arc::new(PluginRegistry::new(self.config.crash_threshold));
        let router = SemanticRouter::new(
            Arc::clone(&registry),
            self.embedder,
            self.config.similarity_cutoff,
            self.config.embedding_cache_size,
        );
        let executor =
            SandboxedExecutor::new(Arc::clone(&registry), self.config.plugin_timeout());

        let remote = match &self.config.remote_base_url {
            Some(base_url) => Some(RemoteReasoningClient::new(
                base_url.clone(),
                self.config.remote_timeout(),
            )?),
            None => None,
        };
        let cascade =
            FallbackCascade::new(remote, local_model, self.config.fallback_message.clone());
        let monitor = HealthMonitor::new(Arc::clone(&registry));

        Ok(Assistant {
            config: self.config,
            registry,
            router,
            executor,
            cascade,
            monitor,
        })
    }
}

pub struct Assistant {
    config: RuntimeConfig,
    registry: Arc<PluginRegistry>,
    router: SemanticRouter,
    executor: SandboxedExecutor,
    cascade: FallbackCascade,
    monitor: HealthMonitor,
}

impl Assistant {
    pub fn builder(config: RuntimeConfig) -> AssistantBuilder {
        AssistantBuilder::new(config)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub async fn register_plugin(&self, plugin: Arc<dyn Plugin>) -> CoreResult<()> {
        self.registry.register(plugin).await
    }

    /// Spawns supervised background tasks and optionally pre-computes
    /// keyword embeddings. Call once after plugin registration.
    pub async fn start(&self) -> CoreResult<()> {
        self.registry.start_background_tasks().await;
        self.router.warm_embeddings().await?;
        info!(plugins = self.registry.len().await, "assistant runtime started");
        Ok(())
    }

    /// Handle one query end to end. Only query validation can fail; once a
    /// `Query` is accepted, the cascade guarantees a response.
    pub async fn handle_query(
        &self,
        text: &str,
        session_id: Option<String>,
    ) -> CoreResult<ExecutionResult> {
        let query = Query::new(text, session_id, self.config.max_query_bytes)?;
        Ok(self.dispatch(&query).await)
    }

    /// Routing decision for a query without executing anything. Useful for
    /// callers that want to inspect or log the decision.
    pub async fn route(&self, text: &str) -> CoreResult<RoutingDecision> {
        let query = Query::new(text, None, self.config.max_query_bytes)?;
        Ok(self.router.route(&query).await)
    }

    async fn dispatch(&self, query: &Query) -> ExecutionResult {
        let decision = self.router.route(query).await;

        if let Some(plugin) = &decision.plugin {
            debug!(plugin = %plugin, reason = ?decision.reason, "routing selected a plugin");
            let result = self.executor.execute(plugin, query.text()).await;
            if result.is_success() {
                return result;
            }
            warn!(
                plugin = %plugin,
                status = ?result.status,
                "abandoning plugin stage, advancing to fallback cascade"
            );
        } else {
            debug!("no confident routing match, entering fallback cascade");
        }

        self.cascade.respond(query).await
    }

    // Administrative surface, consumed by the API layer that sits in front
    // of this core.

    pub async fn list_plugins(&self) -> Vec<PluginDescriptor> {
        self.registry.descriptors().await
    }

    pub async fn restart_plugin(&self, name: &str) -> CoreResult<()> {
        self.registry.restart(name).await
    }

    /// Direct execution of a named plugin, bypassing routing. Still goes
    /// through the sandbox, and still refuses disabled plugins.
    pub async fn run_plugin(&self, name: &str, text: &str) -> CoreResult<ExecutionResult> {
        let query = Query::new(text, None, self.config.max_query_bytes)?;
        Ok(self.executor.execute(name, query.text()).await)
    }

    pub async fn probe_plugin(&self, name: &str) -> CoreResult<ProbeReport> {
        self.executor.probe(name).await
    }

    pub async fn health_report(&self) -> HealthReport {
        self.monitor.report().await
    }
}
