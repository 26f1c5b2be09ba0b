//! Plugin registry and lifecycle management.
//!
//! The registry owns the set of plugin entries and is the single writer of
//! their mutable state. Entries live in an `IndexMap` so iteration order is
//! registration order; the router's tie-break rule depends on that being
//! stable rather than an accident of hashing.

use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::{CoreError, CoreResult};
use crate::plugins::contract::Plugin;
use crate::plugins::descriptor::{PluginDescriptor, PluginEntry};
use crate::types::HealthStatus;

pub struct PluginRegistry {
    entries: RwLock<IndexMap<String, Arc<PluginEntry>>>,
    crash_threshold: u32,
}

impl PluginRegistry {
    pub fn new(crash_threshold: u32) -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
            crash_threshold,
        }
    }

    /// Validates the capability contract and adds the plugin to the registry.
    /// Rejects empty names and duplicates.
    pub async fn register(&self, plugin: Arc<dyn Plugin>) -> CoreResult<()> {
        let name = plugin.name().to_string();
        if name.trim().is_empty() {
            return Err(CoreError::PluginLoadFailure(
                "plugin name must be non-empty".to_string(),
            ));
        }
        let mut entries = self.entries.write().await;
        if entries.contains_key(&name) {
            return Err(CoreError::PluginLoadFailure(format!(
                "duplicate plugin name: {}",
                name
            )));
        }
        info!(plugin = %name, "registering plugin");
        entries.insert(name, Arc::new(PluginEntry::new(plugin)));
        Ok(())
    }

    /// Removes a plugin entirely. In-flight invocations run to completion
    /// against their own `Arc` of the plugin.
    pub async fn unload(&self, name: &str) -> CoreResult<()> {
        let mut entries = self.entries.write().await;
        entries
            .shift_remove(name)
            .map(|_| info!(plugin = %name, "unloaded plugin"))
            .ok_or_else(|| CoreError::PluginNotFound(name.to_string()))
    }

    /// Idempotent. Disabling does not cancel an in-flight call, it only
    /// prevents new ones.
    pub async fn enable(&self, name: &str) -> CoreResult<()> {
        self.with_entry(name, |entry| entry.set_enabled(true)).await
    }

    pub async fn disable(&self, name: &str) -> CoreResult<()> {
        self.with_entry(name, |entry| entry.set_enabled(false))
            .await
    }

    /// Clears the failure streak and re-enables the plugin, making it
    /// routable again after an auto-disable.
    pub async fn restart(&self, name: &str) -> CoreResult<()> {
        self.with_entry(name, |entry| {
            info!(plugin = %name, "restarting plugin");
            entry.reset();
        })
        .await
    }

    /// Spawns every declared background task on its own supervised tokio
    /// task. A panicking task is caught at the task boundary, logged, and
    /// reflected in the plugin's health; the host process never dies with it.
    pub async fn start_background_tasks(&self) {
        let entries = self.entries.read().await;
        for entry in entries.values() {
            let task = match entry.plugin.background_task() {
                Some(task) => task,
                None => continue,
            };
            let name = entry.name.clone();
            debug!(plugin = %name, "spawning background task");
            let handle = tokio::spawn(task);
            let supervised = Arc::clone(entry);
            tokio::spawn(async move {
                match handle.await {
                    Ok(()) => {
                        debug!(plugin = %name, "background task finished");
                    }
                    Err(e) if e.is_panic() => {
                        warn!(plugin = %name, "background task panicked: {}", e);
                        supervised.set_health(HealthStatus::Degraded);
                    }
                    Err(e) => {
                        debug!(plugin = %name, "background task cancelled: {}", e);
                    }
                }
            });
        }
    }

    /// Entries in registration order. Routing iterates this snapshot so a
    /// concurrent register/unload cannot skew an in-progress decision.
    pub(crate) async fn entries_in_order(&self) -> Vec<Arc<PluginEntry>> {
        self.entries.read().await.values().cloned().collect()
    }

    pub(crate) async fn entry(&self, name: &str) -> Option<Arc<PluginEntry>> {
        self.entries.read().await.get(name).cloned()
    }

    /// Failure report from the executor. Escalation to Failed/disabled is
    /// atomic in the entry, so concurrent reports cannot double-fire.
    pub(crate) fn report_failure(&self, entry: &PluginEntry) {
        if entry.record_failure(self.crash_threshold) {
            warn!(
                plugin = %entry.name,
                threshold = self.crash_threshold,
                "crash budget exhausted, auto-disabling plugin until restart"
            );
        }
    }

    pub(crate) fn report_success(&self, entry: &PluginEntry) {
        entry.record_success();
    }

    pub async fn descriptors(&self) -> Vec<PluginDescriptor> {
        self.entries
            .read()
            .await
            .values()
            .map(|entry| entry.snapshot())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn with_entry<F>(&self, name: &str, f: F) -> CoreResult<()>
    where
        F: FnOnce(&PluginEntry),
    {
        let entries = self.entries.read().await;
        match entries.get(name) {
            Some(entry) => {
                f(entry);
                Ok(())
            }
            None => Err(CoreError::PluginNotFound(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Named(&'static str);

    #[async_trait]
    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _query: &str) -> CoreResult<Value> {
            Ok(json!(null))
        }
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_empty_names() {
        let registry = PluginRegistry::new(3);
        registry.register(Arc::new(Named("weather"))).await.unwrap();
        let err = registry
            .register(Arc::new(Named("weather")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::PluginLoadFailure(_)));
        let err = registry.register(Arc::new(Named(""))).await.unwrap_err();
        assert!(matches!(err, CoreError::PluginLoadFailure(_)));
    }

    #[tokio::test]
    async fn test_registration_order_is_stable() {
        let registry = PluginRegistry::new(3);
        for name in ["alpha", "beta", "gamma"] {
            registry.register(Arc::new(Named(name))).await.unwrap();
        }
        let order: Vec<String> = registry
            .entries_in_order()
            .await
            .iter()
            .map(|e| e.name.clone())
            .collect();
        assert_eq!(order, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_lifecycle_operations() {
        let registry = PluginRegistry::new(3);
        registry.register(Arc::new(Named("weather"))).await.unwrap();

        registry.disable("weather").await.unwrap();
        assert!(!registry.entry("weather").await.unwrap().is_enabled());
        // Idempotent.
        registry.disable("weather").await.unwrap();

        registry.enable("weather").await.unwrap();
        assert!(registry.entry("weather").await.unwrap().is_enabled());

        assert!(matches!(
            registry.restart("missing").await,
            Err(CoreError::PluginNotFound(_))
        ));

        registry.unload("weather").await.unwrap();
        assert!(registry.is_empty().await);
    }
}
