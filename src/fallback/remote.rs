//! Client for the remote deep-reasoning service.
//!
//! Wire format: `POST {base_url}/chat` with JSON body `{"message": ...}`;
//! a successful response is JSON containing a string `response` field. Any
//! network error, non-2xx status, or malformed body is `RemoteUnavailable`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{CoreError, CoreResult};

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

pub struct RemoteReasoningClient {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteReasoningClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CoreError::RemoteUnavailable(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, message: &str) -> CoreResult<String> {
        let url = format!("{}/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::RemoteUnavailable(format!(
                "reasoning service returned {}",
                status
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CoreError::RemoteUnavailable(format!("malformed response body: {}", e)))?;
        Ok(body.response)
    }
}
