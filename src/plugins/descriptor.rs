//! Per-plugin bookkeeping owned by the registry.
//!
//! Mutable fields (enabled, consecutive_failures, health) are shared across
//! all query workers and the health monitor, so they live in atomics. The
//! registry is the only writer; the executor reports outcomes to it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::plugins::contract::Plugin;
use crate::types::HealthStatus;

/// Read-only snapshot of one plugin's descriptor, as exposed to the
/// administrative surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub keywords: Vec<String>,
    pub enabled: bool,
    pub consecutive_failures: u32,
    pub health: HealthStatus,
}

/// Live registry entry: the plugin itself plus its mutable state and the
/// cached embeddings of its keywords.
pub(crate) struct PluginEntry {
    pub(crate) plugin: Arc<dyn Plugin>,
    pub(crate) name: String,
    pub(crate) keywords: Vec<String>,
    enabled: AtomicBool,
    consecutive_failures: AtomicU32,
    health: AtomicU8,
    /// One vector per keyword, computed once on the first routing pass
    /// (or eagerly via `SemanticRouter::warm_embeddings`).
    pub(crate) keyword_embeddings: RwLock<Option<Arc<Vec<Vec<f32>>>>>,
}

impl PluginEntry {
    pub(crate) fn new(plugin: Arc<dyn Plugin>) -> Self {
        let name = plugin.name().to_string();
        let keywords = plugin.keywords();
        Self {
            plugin,
            name,
            keywords,
            enabled: AtomicBool::new(true),
            consecutive_failures: AtomicU32::new(0),
            health: AtomicU8::new(HealthStatus::Unknown.as_u8()),
            keyword_embeddings: RwLock::new(None),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn health(&self) -> HealthStatus {
        HealthStatus::from_u8(self.health.load(Ordering::SeqCst))
    }

    pub(crate) fn set_health(&self, status: HealthStatus) {
        self.health.store(status.as_u8(), Ordering::SeqCst);
    }

    pub(crate) fn failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Atomically bumps the failure streak and, exactly once per escalation,
    /// flips the plugin to Failed/disabled when the streak reaches the
    /// threshold. Returns true for the report that crossed the line, so
    /// concurrent failure reports cannot double-escalate.
    pub(crate) fn record_failure(&self, threshold: u32) -> bool {
        let streak = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
        if streak == threshold {
            self.set_health(HealthStatus::Failed);
            self.set_enabled(false);
            true
        } else {
            if streak < threshold {
                self.set_health(HealthStatus::Degraded);
            }
            false
        }
    }

    /// A success clears the failure streak.
    pub(crate) fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.set_health(HealthStatus::Ok);
    }

    /// Resets counters and re-enables the plugin. Used by `restart`.
    pub(crate) fn reset(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
        self.set_health(HealthStatus::Unknown);
        self.set_enabled(true);
    }

    pub(crate) fn snapshot(&self) -> PluginDescriptor {
        PluginDescriptor {
            name: self.name.clone(),
            keywords: self.keywords.clone(),
            enabled: self.is_enabled(),
            consecutive_failures: self.failures(),
            health: self.health(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use crate::errors::CoreResult;

    struct Echo;

    #[async_trait]
    impl Plugin for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn keywords(&self) -> Vec<String> {
            vec!["echo".to_string()]
        }

        async fn run(&self, query: &str) -> CoreResult<Value> {
            Ok(json!({ "echo": query }))
        }
    }

    #[test]
    fn test_failure_streak_escalates_once() {
        let entry = PluginEntry::new(Arc::new(Echo));
        assert!(!entry.record_failure(3));
        assert_eq!(entry.health(), HealthStatus::Degraded);
        assert!(!entry.record_failure(3));
        assert!(entry.record_failure(3));
        assert_eq!(entry.health(), HealthStatus::Failed);
        assert!(!entry.is_enabled());
        // Further failures past the threshold do not re-escalate.
        assert!(!entry.record_failure(3));
    }

    #[test]
    fn test_success_clears_streak() {
        let entry = PluginEntry::new(Arc::new(Echo));
        entry.record_failure(3);
        entry.record_failure(3);
        entry.record_success();
        assert_eq!(entry.failures(), 0);
        assert_eq!(entry.health(), HealthStatus::Ok);
        assert!(entry.is_enabled());
    }

    #[test]
    fn test_reset_reenables() {
        let entry = PluginEntry::new(Arc::new(Echo));
        for _ in 0..3 {
            entry.record_failure(3);
        }
        assert!(!entry.is_enabled());
        entry.reset();
        assert!(entry.is_enabled());
        assert_eq!(entry.failures(), 0);
        assert_eq!(entry.health(), HealthStatus::Unknown);
    }
}
