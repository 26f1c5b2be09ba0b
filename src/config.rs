//! Runtime configuration for the orchestration core.
//!
//! All knobs have defaults matching production behavior; each can be
//! overridden through a `CONCIERGE_*` environment variable so deployments
//! can tune thresholds without a redeploy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Cosine similarity a routing candidate must strictly exceed.
    pub similarity_cutoff: f32,
    /// Consecutive failures after which a plugin is auto-disabled.
    pub crash_threshold: u32,
    /// Wall-clock bound for a single plugin invocation, in seconds.
    pub plugin_timeout_secs: u64,
    /// Wall-clock bound for the remote reasoning call, in seconds.
    pub remote_timeout_secs: u64,
    /// Base URL of the remote reasoning service; None disables the stage.
    pub remote_base_url: Option<String>,
    /// Path to a local GGUF model; None disables the stage.
    pub local_model_path: Option<String>,
    /// Upper bound on the query-embedding LRU cache.
    pub embedding_cache_size: usize,
    /// Terminal apology returned when every other stage has failed.
    pub fallback_message: String,
    /// Upper bound on accepted query text, in bytes.
    pub max_query_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            similarity_cutoff: 0.65,
            crash_threshold: 3,
            plugin_timeout_secs: 30,
            remote_timeout_secs: 60,
            remote_base_url: None,
            local_model_path: None,
            embedding_cache_size: 512,
            fallback_message: "I'm sorry, I can't help with that right now. Please try again later."
                .to_string(),
            max_query_bytes: 8 * 1024,
        }
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with any `CONCIERGE_*` environment overrides.
    /// Unparseable values are ignored in favor of the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_parse::<f32>("CONCIERGE_SIMILARITY_CUTOFF") {
            config.similarity_cutoff = v;
        }
        if let Some(v) = env_parse::<u32>("CONCIERGE_CRASH_THRESHOLD") {
            config.crash_threshold = v;
        }
        if let Some(v) = env_parse::<u64>("CONCIERGE_PLUGIN_TIMEOUT_SECS") {
            config.plugin_timeout_secs = v;
        }
        if let Some(v) = env_parse::<u64>("CONCIERGE_REMOTE_TIMEOUT_SECS") {
            config.remote_timeout_secs = v;
        }
        if let Ok(v) = std::env::var("CONCIERGE_REMOTE_BASE_URL") {
            if !v.is_empty() {
                config.remote_base_url = Some(v);
            }
        }
        if let Ok(v) = std::env::var("CONCIERGE_LOCAL_MODEL_PATH") {
            if !v.is_empty() {
                config.local_model_path = Some(v);
            }
        }
        if let Some(v) = env_parse::<usize>("CONCIERGE_EMBEDDING_CACHE_SIZE") {
            config.embedding_cache_size = v;
        }
        if let Ok(v) = std::env::var("CONCIERGE_FALLBACK_MESSAGE") {
            if !v.is_empty() {
                config.fallback_message = v;
            }
        }
        config
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(-1.0..=1.0).contains(&self.similarity_cutoff) {
            return Err(CoreError::InvalidConfig(format!(
                "similarity_cutoff must be within [-1, 1], got {}",
                self.similarity_cutoff
            )));
        }
        if self.crash_threshold == 0 {
            return Err(CoreError::InvalidConfig(
                "crash_threshold must be at least 1".to_string(),
            ));
        }
        if self.embedding_cache_size == 0 {
            return Err(CoreError::InvalidConfig(
                "embedding_cache_size must be at least 1".to_string(),
            ));
        }
        if self.fallback_message.trim().is_empty() {
            return Err(CoreError::InvalidConfig(
                "fallback_message must be non-empty".to_string(),
            ));
        }
        if self.plugin_timeout_secs == 0 || self.remote_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig(
                "timeouts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn plugin_timeout(&self) -> Duration {
        Duration::from_secs(self.plugin_timeout_secs)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_secs(self.remote_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
