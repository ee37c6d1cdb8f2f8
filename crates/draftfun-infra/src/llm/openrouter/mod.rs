//! OpenRouterBackend -- concrete [`GenerationBackend`] for OpenRouter.
//!
//! Sends chat completions requests to the OpenRouter API and decodes
//! the SSE response body into [`StreamEvent`] frames. Reasoning content
//! is separated from primary text both ways OpenRouter delivers it: a
//! dedicated `reasoning` delta field, and inline `<think>` blocks
//! inside the content channel.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never
//! logged or included in `Debug` output.

pub mod reasoning;
pub mod types;

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};

use draftfun_core::backend::{FrameStream, GenerationBackend};
use draftfun_types::llm::{BackendError, GenerationRequest, StreamEvent};

use self::reasoning::{FilteredPiece, ThinkTagFilter};
use self::types::{ChatCompletionChunk, ChatRequest};

/// OpenRouter generation backend.
///
/// Deliberately does not derive `Debug`: the API key must never reach
/// logs or error output.
pub struct OpenRouterBackend {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenRouterBackend {
    /// Create a new OpenRouter backend.
    pub fn new(api_key: SecretString) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // long generations
            .build()
            .expect("failed to create reqwest client");

        Self {
            client,
            api_key,
            base_url: "https://openrouter.ai/api/v1".to_string(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl GenerationBackend for OpenRouterBackend {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn stream(&self, request: GenerationRequest) -> FrameStream {
        let body = ChatRequest::from(request);
        let url = self.url("/chat/completions");
        let client = self.client.clone();
        let authorization = format!("Bearer {}", self.api_key.expose_secret());

        Box::pin(async_stream::try_stream! {
            let response = client
                .post(&url)
                .header("authorization", &authorization)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| BackendError::Provider {
                    message: format!("HTTP request failed: {e}"),
                })?;

            let status = response.status();
            if !status.is_success() {
                let error_body = response.text().await.unwrap_or_default();
                Err(match status.as_u16() {
                    401 | 403 => BackendError::AuthenticationFailed,
                    429 => BackendError::RateLimited,
                    400 => BackendError::InvalidRequest(error_body),
                    _ => BackendError::Provider {
                        message: format!("HTTP {status}: {error_body}"),
                    },
                })?;
                unreachable!("error status always propagates above");
            }

            yield StreamEvent::Connected;

            let mut filter = ThinkTagFilter::new();
            let mut events = response.bytes_stream().eventsource();
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| BackendError::Stream(e.to_string()))?;
                if event.data == "[DONE]" {
                    break;
                }
                // OpenRouter interleaves comment keepalives; eventsource
                // already strips those, so every event here carries JSON.
                let chunk: ChatCompletionChunk = serde_json::from_str(&event.data)
                    .map_err(|e| BackendError::Deserialization(format!(
                        "failed to parse stream chunk: {e}"
                    )))?;

                let mut finished = false;
                for choice in &chunk.choices {
                    if let Some(reasoning) = &choice.delta.reasoning {
                        if !reasoning.is_empty() {
                            yield StreamEvent::ReasoningDelta {
                                text: reasoning.clone(),
                            };
                        }
                    }
                    if let Some(content) = &choice.delta.content {
                        for piece in filter.push(content) {
                            match piece {
                                FilteredPiece::Text(text) => {
                                    yield StreamEvent::TextDelta { text };
                                }
                                FilteredPiece::Reasoning(text) => {
                                    yield StreamEvent::ReasoningDelta { text };
                                }
                            }
                        }
                    }
                    if choice.finish_reason.is_some() {
                        finished = true;
                    }
                }
                // The terminal chunk carries a finish_reason; [DONE] is
                // only a trailer after it.
                if finished {
                    break;
                }
            }

            if let Some(piece) = filter.finish() {
                match piece {
                    FilteredPiece::Text(text) => yield StreamEvent::TextDelta { text },
                    FilteredPiece::Reasoning(text) => yield StreamEvent::ReasoningDelta { text },
                }
            }

            yield StreamEvent::Done;
        })
    }
}
