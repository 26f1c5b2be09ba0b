//! The fallback cascade: remote reasoning, then the local model, then a
//! static message.
//!
//! A strictly linear machine with no reordering and no speculative
//! execution. Every abandoned stage logs the reason it was given up, and the
//! terminal stage cannot fail, so every query gets some answer within the
//! sum of the per-stage timeouts.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fallback::local::GenerativeModel;
use crate::fallback::remote::RemoteReasoningClient;
use crate::types::{ExecutionResult, Query, SourceTag};

/// Token bound passed to the local model for a single answer.
const LOCAL_MODEL_MAX_TOKENS: usize = 256;

pub struct FallbackCascade {
    remote: Option<RemoteReasoningClient>,
    local: Option<Arc<dyn GenerativeModel>>,
    fallback_message: String,
}

impl FallbackCascade {
    pub fn new(
        remote: Option<RemoteReasoningClient>,
        local: Option<Arc<dyn GenerativeModel>>,
        fallback_message: String,
    ) -> Self {
        Self {
            remote,
            local,
            fallback_message,
        }
    }

    /// Runs stages 2-4 (the plugin attempt, stage 1, happens upstream when
    /// routing selected one). Infallible by construction.
    pub async fn respond(&self, query: &Query) -> ExecutionResult {
        if let Some(remote) = &self.remote {
            match remote.chat(query.text()).await {
                Ok(answer) => {
                    return ExecutionResult::success(
                        Value::String(answer),
                        SourceTag::RemoteReasoning,
                    );
                }
                Err(e) => {
                    warn!("abandoning remote reasoning stage: {}", e);
                }
            }
        } else {
            debug!("no remote reasoning service configured, skipping stage");
        }

        if let Some(local) = &self.local {
            match local
                .complete(query.text(), &[], LOCAL_MODEL_MAX_TOKENS)
                .await
            {
                Ok(answer) => {
                    return ExecutionResult::success(Value::String(answer), SourceTag::LocalModel);
                }
                Err(e) => {
                    warn!("abandoning local model stage: {}", e);
                }
            }
        } else {
            debug!("no local model configured, skipping stage");
        }

        ExecutionResult::success(
            Value::String(self.fallback_message.clone()),
            SourceTag::FallbackMessage,
        )
    }
}
