//! Core value types shared across the registry, router, executor and cascade.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::errors::{CoreError, CoreResult};

/// Coarse classification of a plugin's operability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Failed,
    Unknown,
}

impl HealthStatus {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            HealthStatus::Ok => 0,
            HealthStatus::Degraded => 1,
            HealthStatus::Failed => 2,
            HealthStatus::Unknown => 3,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => HealthStatus::Ok,
            1 => HealthStatus::Degraded,
            2 => HealthStatus::Failed,
            _ => HealthStatus::Unknown,
        }
    }
}

/// An inbound free-text query. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    session_id: Option<String>,
}

impl Query {
    /// Validates and wraps a raw query string. Rejects empty (after trim)
    /// and oversized inputs.
    pub fn new(
        text: impl Into<String>,
        session_id: Option<String>,
        max_bytes: usize,
    ) -> CoreResult<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(CoreError::InvalidQuery("query text is empty".to_string()));
        }
        if text.len() > max_bytes {
            return Err(CoreError::InvalidQuery(format!(
                "query text exceeds {} bytes",
                max_bytes
            )));
        }
        Ok(Self { text, session_id })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

/// Why the router picked (or did not pick) a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchReason {
    EmbeddingMatch,
    KeywordMatch,
    NoMatch,
}

/// Score backing a routing decision. Embedding-based routing produces a
/// cosine similarity in [-1, 1]; degraded keyword routing only knows
/// whether a keyword was contained in the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchScore {
    Similarity(f32),
    Keyword(bool),
    None,
}

/// Outcome of the routing pass over the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub plugin: Option<String>,
    pub score: MatchScore,
    pub reason: MatchReason,
}

impl RoutingDecision {
    pub fn no_match() -> Self {
        Self {
            plugin: None,
            score: MatchScore::None,
            reason: MatchReason::NoMatch,
        }
    }
}

/// Which stage of the system produced the final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTag {
    Plugin(String),
    RemoteReasoning,
    LocalModel,
    FallbackMessage,
}

impl SourceTag {
    pub fn as_str(&self) -> &str {
        match self {
            SourceTag::Plugin(name) => name,
            SourceTag::RemoteReasoning => "remote-reasoning",
            SourceTag::LocalModel => "local-model",
            SourceTag::FallbackMessage => "fallback-message",
        }
    }
}

impl std::fmt::Display for SourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecStatus {
    Success,
    Timeout,
    Crash,
    NotFound,
}

/// Result of one plugin invocation, or of the cascade as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub status: ExecStatus,
    pub payload: Value,
    pub source: SourceTag,
}

impl ExecutionResult {
    pub fn success(payload: Value, source: SourceTag) -> Self {
        Self {
            status: ExecStatus::Success,
            payload,
            source,
        }
    }

    pub fn failed(status: ExecStatus, source: SourceTag) -> Self {
        Self {
            status,
            payload: Value::Null,
            source,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ExecStatus::Success
    }

    /// Collapse into a `CoreResult`, for callers of the administrative
    /// surface that want error semantics instead of a status value.
    pub fn into_result(self) -> CoreResult<Value> {
        let name = self.source.as_str().to_string();
        match self.status {
            ExecStatus::Success => Ok(self.payload),
            ExecStatus::Timeout => Err(CoreError::PluginTimeout(name)),
            ExecStatus::Crash => Err(CoreError::PluginCrash {
                name,
                detail: "invocation failed inside the sandbox".to_string(),
            }),
            ExecStatus::NotFound => Err(CoreError::PluginNotFound(name)),
        }
    }
}
