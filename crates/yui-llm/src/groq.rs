// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Groq provider adapter (OpenAI-compatible chat completions API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use yui_core::YuiError;
use yui_core::traits::adapter::PluginAdapter;
use yui_core::traits::provider::ProviderAdapter;
use yui_core::types::{AdapterType, HealthStatus, ProviderRequest};

use crate::is_transient_error;

const API_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model used when `llm.model` is empty.
pub const DEFAULT_MODEL: &str = "llama3-70b-8192";

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP client for the Groq chat completions API.
///
/// Bearer auth via default headers, connection pooling, and one retry on
/// transient errors (429, 500, 503).
pub struct GroqProvider {
    client: reqwest::Client,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl GroqProvider {
    /// Creates a new Groq client. An empty `model` selects [`DEFAULT_MODEL`].
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, YuiError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| YuiError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| YuiError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            model: if model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                model.to_string()
            },
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn build_request(&self, request: &ProviderRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system_prompt {
            messages.push(WireMessage {
                role: "system",
                content: system.clone(),
            });
        }
        for msg in &request.messages {
            messages.push(WireMessage {
                role: msg.role.as_str(),
                content: msg.content.clone(),
            });
        }
        ChatRequest {
            model: if request.model.is_empty() {
                self.model.clone()
            } else {
                request.model.clone()
            },
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, YuiError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), YuiError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GroqProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<String, YuiError> {
        let body = self.build_request(&request);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Groq request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&self.base_url)
                .json(&body)
                .send()
                .await
                .map_err(|e| YuiError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "Groq response received");

            if status.is_success() {
                let parsed: ChatResponse =
                    response.json().await.map_err(|e| YuiError::Provider {
                        message: format!("failed to parse Groq response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| YuiError::Provider {
                        message: "Groq response contained no choices".into(),
                        source: None,
                    });
            }

            let text = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %text, "transient error, will retry");
                last_error = Some(YuiError::Provider {
                    message: format!("Groq API returned {status}: {text}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(api_err) => format!("Groq API error ({status}): {}", api_err.error.message),
                Err(_) => format!("Groq API returned {status}: {text}"),
            };
            return Err(YuiError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| YuiError::Provider {
            message: "Groq request failed after retries".into(),
            source: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use yui_core::types::ChatMessage;

    fn sample_request() -> ProviderRequest {
        ProviderRequest {
            model: String::new(),
            system_prompt: Some("You are Yui.".to_string()),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 256,
        }
    }

    fn provider_for(server: &MockServer) -> GroqProvider {
        GroqProvider::new("test-key".to_string(), "", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn generate_returns_first_choice_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "messages": [
                    {"role": "system", "content": "You are Yui."},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let text = provider.generate(sample_request()).await.unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn api_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"message": "model not found"}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.generate(sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("model not found"));
    }

    #[tokio::test]
    async fn transient_error_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "recovered"}}]
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let text = provider.generate(sample_request()).await.unwrap();
        assert_eq!(text, "recovered");
    }

    #[tokio::test]
    async fn empty_choices_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let err = provider.generate(sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
