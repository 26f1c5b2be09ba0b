//! The capability contract every plugin implements.
//!
//! A plugin is any `Send + Sync` type exposing a stable name, routing
//! keywords, and an async `run` body. The health probe and background task
//! hooks are optional; the defaults report healthy and declare no task.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;

use crate::errors::CoreResult;
use crate::types::HealthStatus;

/// Result of a health probe against a single plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub status: HealthStatus,
    pub detail: Option<String>,
}

impl ProbeReport {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

#[async_trait]
pub trait Plugin: Send + Sync {
    /// Stable, non-empty identity. Duplicate names are rejected at load time.
    fn name(&self) -> &str;

    /// Keywords used for routing. A plugin with no keywords is only reachable
    /// through direct execution, never by semantic match.
    fn keywords(&self) -> Vec<String> {
        Vec::new()
    }

    /// Handle a query. Any returned error is treated uniformly as a crash by
    /// the executor; the plugin body never needs to care about isolation.
    async fn run(&self, query: &str) -> CoreResult<Value>;

    /// Optional health probe. Plugins without one report a default Ok.
    async fn health(&self) -> ProbeReport {
        ProbeReport::ok()
    }

    /// Optional long-running task, spawned once at load time on its own
    /// supervised tokio task. The future must be self-contained ('static);
    /// implementations typically clone their shared state into it.
    fn background_task(&self) -> Option<BoxFuture<'static, ()>> {
        None
    }

    /// Per-plugin override of the executor's invocation timeout.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}
