//! Registry-wide health aggregation.
//!
//! A read-only consumer of registry state: buckets plugins by health status
//! and applies a coarse policy. Any Failed or Degraded plugin pulls the
//! system to at least Yellow; a majority of Failed plugins means Red.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::plugins::descriptor::PluginDescriptor;
use crate::plugins::registry::PluginRegistry;
use crate::types::HealthStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounts {
    pub ok: usize,
    pub degraded: usize,
    pub failed: usize,
    pub unknown: usize,
}

impl HealthCounts {
    pub fn total(&self) -> usize {
        self.ok + self.degraded + self.failed + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall: SystemHealth,
    pub counts: HealthCounts,
    pub plugins: Vec<PluginDescriptor>,
    pub generated_at: DateTime<Utc>,
}

pub struct HealthMonitor {
    registry: Arc<PluginRegistry>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self { registry }
    }

    pub async fn report(&self) -> HealthReport {
        let plugins = self.registry.descriptors().await;
        let mut counts = HealthCounts::default();
        for plugin in &plugins {
            match plugin.health {
                HealthStatus::Ok => counts.ok += 1,
                HealthStatus::Degraded => counts.degraded += 1,
                HealthStatus::Failed => counts.failed += 1,
                HealthStatus::Unknown => counts.unknown += 1,
            }
        }
        HealthReport {
            overall: aggregate(&counts),
            counts,
            plugins,
            generated_at: Utc::now(),
        }
    }
}

fn aggregate(counts: &HealthCounts) -> SystemHealth {
    let total = counts.total();
    if total == 0 {
        return SystemHealth::Green;
    }
    if counts.failed * 2 > total {
        SystemHealth::Red
    } else if counts.failed > 0 || counts.degraded > 0 {
        SystemHealth::Yellow
    } else {
        SystemHealth::Green
    }
}
