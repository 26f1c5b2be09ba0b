//! Error taxonomy for the orchestration core.
//!
//! Plugin-level faults (timeout, crash) are recovered by the executor and
//! surface as counters and health transitions, never as panics crossing the
//! plugin/host boundary. A routing miss is not an error at all; it is a
//! normal input to the fallback cascade.

use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("plugin load failure: {0}")]
    PluginLoadFailure(String),

    #[error("plugin '{0}' timed out")]
    PluginTimeout(String),

    #[error("plugin '{name}' crashed: {detail}")]
    PluginCrash { name: String, detail: String },

    #[error("remote reasoning unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("local model unavailable: {0}")]
    LocalModelUnavailable(String),

    /// Only reachable if the static fallback step itself were to fail,
    /// which by construction it cannot.
    #[error("all fallback stages exhausted")]
    AllFallbacksExhausted,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("embedding failed: {0}")]
    Embedding(String),
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::RemoteUnavailable(e.to_string())
    }
}
