//! Sandboxed plugin execution.
//!
//! Each invocation runs on its own tokio task so a panic inside the plugin
//! body is contained by the task boundary and never unwinds into the caller.
//! The wait is bounded by a wall-clock timeout; a timed-out task is aborted
//! and its result, if any, is discarded rather than delivered late.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::{CoreError, CoreResult};
use crate::plugins::contract::ProbeReport;
use crate::plugins::descriptor::PluginEntry;
use crate::plugins::registry::PluginRegistry;
use crate::types::{ExecStatus, ExecutionResult, SourceTag};

/// Bound on the optional health probe. Probes are cheap; a plugin that can't
/// answer within this window is reported as failed.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SandboxedExecutor {
    registry: Arc<PluginRegistry>,
    default_timeout: Duration,
}

impl SandboxedExecutor {
    pub fn new(registry: Arc<PluginRegistry>, default_timeout: Duration) -> Self {
        Self {
            registry,
            default_timeout,
        }
    }

    /// Runs one plugin invocation with crash isolation. A disabled or
    /// unknown plugin yields `NotFound`; every failure outcome is reported
    /// to the registry, and a success clears the plugin's failure streak.
    pub async fn execute(&self, name: &str, query: &str) -> ExecutionResult {
        let entry = match self.registry.entry(name).await {
            Some(entry) if entry.is_enabled() => entry,
            _ => {
                debug!(plugin = %name, "execution refused: unknown or disabled plugin");
                return ExecutionResult::failed(
                    ExecStatus::NotFound,
                    SourceTag::Plugin(name.to_string()),
                );
            }
        };
        self.execute_entry(&entry, query).await
    }

    pub(crate) async fn execute_entry(&self, entry: &PluginEntry, query: &str) -> ExecutionResult {
        let budget = entry.plugin.timeout().unwrap_or(self.default_timeout);
        let plugin = Arc::clone(&entry.plugin);
        let query = query.to_string();
        let mut handle = tokio::spawn(async move { plugin.run(&query).await });

        let source = SourceTag::Plugin(entry.name.clone());
        match timeout(budget, &mut handle).await {
            Err(_elapsed) => {
                // Best-effort cooperative cancellation; the task is detached
                // either way and its late result is never observed.
                handle.abort();
                warn!(
                    plugin = %entry.name,
                    timeout_ms = budget.as_millis() as u64,
                    "plugin invocation timed out"
                );
                self.registry.report_failure(entry);
                ExecutionResult::failed(ExecStatus::Timeout, source)
            }
            Ok(Err(join_err)) => {
                let detail = if join_err.is_panic() {
                    "panic in plugin body".to_string()
                } else {
                    join_err.to_string()
                };
                warn!(plugin = %entry.name, "plugin crashed: {}", detail);
                self.registry.report_failure(entry);
                ExecutionResult::failed(ExecStatus::Crash, source)
            }
            Ok(Ok(Err(fault))) => {
                warn!(plugin = %entry.name, "plugin returned a fault: {}", fault);
                self.registry.report_failure(entry);
                ExecutionResult::failed(ExecStatus::Crash, source)
            }
            Ok(Ok(Ok(payload))) => {
                self.registry.report_success(entry);
                ExecutionResult::success(payload, source)
            }
        }
    }

    /// Calls the plugin's optional health method with the same isolation
    /// guarantee as `execute`. Plugins without one report a default Ok.
    pub async fn probe(&self, name: &str) -> CoreResult<ProbeReport> {
        let entry = self
            .registry
            .entry(name)
            .await
            .ok_or_else(|| CoreError::PluginNotFound(name.to_string()))?;

        let plugin = Arc::clone(&entry.plugin);
        let handle = tokio::spawn(async move { plugin.health().await });
        let report = match timeout(PROBE_TIMEOUT, handle).await {
            Err(_elapsed) => ProbeReport::failed("health probe timed out"),
            Ok(Err(join_err)) => ProbeReport::failed(format!("health probe panicked: {}", join_err)),
            Ok(Ok(report)) => report,
        };
        entry.set_health(report.status);
        Ok(report)
    }
}
