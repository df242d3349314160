// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama provider adapter for local models (no API key).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use yui_core::YuiError;
use yui_core::traits::adapter::PluginAdapter;
use yui_core::traits::provider::ProviderAdapter;
use yui_core::types::{AdapterType, HealthStatus, ProviderRequest};

const API_BASE_URL: &str = "http://localhost:11434";

/// Default model used when `llm.model` is empty.
pub const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for a local Ollama daemon.
///
/// No auth and no retry: the daemon is local, so a failure is either
/// "not running" or a real fault, and retrying adds nothing but latency.
pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    base_url: String,
}

impl OllamaProvider {
    /// Creates a new Ollama client. An empty `model` selects [`DEFAULT_MODEL`].
    pub fn new(model: &str, timeout: Duration) -> Result<Self, YuiError> {
        let client = reqwest::Client::builder()
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
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl PluginAdapter for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, YuiError> {
        // A quick GET / tells us whether the daemon is up.
        match self.client.get(&self.base_url).send().await {
            Ok(r) if r.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(r) => Ok(HealthStatus::Degraded(format!("status {}", r.status()))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("daemon unreachable: {e}"))),
        }
    }

    async fn shutdown(&self) -> Result<(), YuiError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OllamaProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<String, YuiError> {
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

        let body = ChatRequest {
            model: if request.model.is_empty() {
                self.model.clone()
            } else {
                request.model.clone()
            },
            messages,
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| YuiError::Provider {
                message: format!(
                    "cannot reach Ollama at {}: {e} (is the daemon running? try `ollama serve`)",
                    self.base_url
                ),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "Ollama response received");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(YuiError::Provider {
                message: format!("Ollama returned {status}: {text}"),
                source: None,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| YuiError::Provider {
            message: format!("failed to parse Ollama response: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(parsed.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use yui_core::types::ChatMessage;

    fn sample_request() -> ProviderRequest {
        ProviderRequest {
            model: String::new(),
            system_prompt: None,
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 256,
        }
    }

    #[tokio::test]
    async fn generate_parses_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "hello from local"}
            })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new("", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let text = provider.generate(sample_request()).await.unwrap();
        assert_eq!(text, "hello from local");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model missing"))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new("", Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let err = provider.generate(sample_request()).await.unwrap_err();
        assert!(err.to_string().contains("404"));
    }
}
