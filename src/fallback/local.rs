//! Local generative model support for the cascade's third stage.
//!
//! The model is a single heavyweight resource: one instance per process,
//! constructed explicitly at startup and handed to the cascade, with access
//! serialized through a mutex. An absent model path is not an error; the
//! cascade simply skips to the static fallback.

use async_trait::async_trait;

use crate::errors::CoreResult;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Complete a prompt, honoring the stop sequences and token bound.
    async fn complete(
        &self,
        prompt: &str,
        stop: &[String],
        max_tokens: usize,
    ) -> CoreResult<String>;
}

#[cfg(feature = "llm")]
pub use llama::LocalLlamaModel;

#[cfg(feature = "llm")]
mod llama {
    use super::GenerativeModel;
    use crate::errors::{CoreError, CoreResult};
    use async_trait::async_trait;
    use llama_cpp::standard_sampler::StandardSampler;
    use llama_cpp::{LlamaModel, LlamaParams, SessionParams};
    use std::path::Path;
    use tokio::sync::Mutex;

    /// Lazily loaded llama-cpp model. The mutex both guards the lazy load
    /// and serializes inference, since sessions borrow the model.
    pub struct LocalLlamaModel {
        model_path: String,
        model: Mutex<Option<LlamaModel>>,
    }

    impl LocalLlamaModel {
        pub fn new(model_path: impl Into<String>) -> Self {
            Self {
                model_path: model_path.into(),
                model: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for LocalLlamaModel {
        async fn complete(
            &self,
            prompt: &str,
            stop: &[String],
            max_tokens: usize,
        ) -> CoreResult<String> {
            let mut guard = self.model.lock().await;
            if guard.is_none() {
                if !Path::new(&self.model_path).exists() {
                    return Err(CoreError::LocalModelUnavailable(format!(
                        "model file not found: {}",
                        self.model_path
                    )));
                }
                let model = LlamaModel::load_from_file(&self.model_path, LlamaParams::default())
                    .map_err(|e| CoreError::LocalModelUnavailable(e.to_string()))?;
                *guard = Some(model);
            }
            let model = guard
                .as_ref()
                .ok_or_else(|| CoreError::LocalModelUnavailable("model not loaded".to_string()))?;

            let mut session = model
                .create_session(SessionParams::default())
                .map_err(|e| CoreError::LocalModelUnavailable(e.to_string()))?;
            session
                .advance_context(prompt)
                .map_err(|e| CoreError::LocalModelUnavailable(e.to_string()))?;

            let completions = session
                .start_completing_with(StandardSampler::default(), max_tokens)
                .map_err(|e| CoreError::LocalModelUnavailable(e.to_string()))?;

            let mut response = String::new();
            for piece in completions.into_strings() {
                response.push_str(&piece);
                if let Some(cut) = stop.iter().filter_map(|s| response.find(s.as_str())).min() {
                    response.truncate(cut);
                    break;
                }
            }
            Ok(response)
        }
    }
}
