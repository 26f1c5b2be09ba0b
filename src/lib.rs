//! Concierge - plugin orchestration and routing runtime for a personal
//! assistant backend.
//!
//! Free-text queries are routed to pluggable capability handlers by semantic
//! similarity (or keyword containment when no embedding backend is
//! available). Plugins run inside a sandboxed executor with per-call
//! timeouts and crash isolation; repeated failures auto-disable a plugin
//! until an operator restarts it. When routing finds no confident match, or
//! the selected plugin fails, a linear fallback cascade tries a remote
//! reasoning service, then a local generative model, and finally returns a
//! static message, so every query gets a bounded-latency answer.

pub mod assistant;
pub mod config;
pub mod errors;
pub mod fallback;
pub mod health;
pub mod plugins;
pub mod routing;
pub mod types;

pub use assistant::{Assistant, AssistantBuilder};
pub use config::RuntimeConfig;
pub use errors::{CoreError, CoreResult};
pub use fallback::{FallbackCascade, GenerativeModel, RemoteReasoningClient};
pub use health::{HealthMonitor, HealthReport, SystemHealth};
pub use plugins::{Plugin, PluginDescriptor, PluginRegistry, ProbeReport, SandboxedExecutor};
pub use routing::{Embedder, HashEmbedder, SemanticRouter};
pub use types::{
    ExecStatus, ExecutionResult, HealthStatus, MatchReason, MatchScore, Query, RoutingDecision,
    SourceTag,
};

/// Initializes a `tracing` subscriber honoring `RUST_LOG`. Intended for
/// binaries and examples embedding the runtime; safe to call once.
pub fn init_telemetry() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
