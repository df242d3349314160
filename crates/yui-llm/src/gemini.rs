// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter (generateContent API).
//!
//! Gemini has no native system role: the system prompt is folded in as a
//! leading user turn followed by a canned model acknowledgement.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use yui_core::YuiError;
use yui_core::traits::adapter::PluginAdapter;
use yui_core::traits::provider::ProviderAdapter;
use yui_core::types::{AdapterType, HealthStatus, ProviderRequest, Role};

use crate::is_transient_error;

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model used when `llm.model` is empty.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// HTTP client for the Gemini generateContent API.
///
/// The API key travels as a query parameter per Google's scheme. One retry
/// on transient errors (429, 500, 503).
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_retries: u32,
    base_url: String,
}

impl GeminiProvider {
    /// Creates a new Gemini client. An empty `model` selects [`DEFAULT_MODEL`].
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, YuiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| YuiError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
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

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn build_request(&self, request: &ProviderRequest) -> GenerateRequest {
        let mut contents = Vec::with_capacity(request.messages.len() + 2);
        if let Some(system) = &request.system_prompt {
            contents.push(Content {
                role: "user",
                parts: vec![Part {
                    text: system.clone(),
                }],
            });
            contents.push(Content {
                role: "model",
                parts: vec![Part {
                    text: "Understood. I'll follow these guidelines.".to_string(),
                }],
            });
        }
        for msg in &request.messages {
            contents.push(Content {
                role: match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                },
                parts: vec![Part {
                    text: msg.content.clone(),
                }],
            });
        }
        GenerateRequest {
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            },
        }
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
impl ProviderAdapter for GeminiProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<String, YuiError> {
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        let body = self.build_request(&request);
        let url = self.endpoint(&model);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying Gemini request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .await
                .map_err(|e| YuiError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, "Gemini response received");

            if status.is_success() {
                let parsed: GenerateResponse =
                    response.json().await.map_err(|e| YuiError::Provider {
                        message: format!("failed to parse Gemini response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return parsed
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content.parts.into_iter().next())
                    .map(|p| p.text)
                    .ok_or_else(|| YuiError::Provider {
                        message: "Gemini response contained no candidates".into(),
                        source: None,
                    });
            }

            let text = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %text, "transient error, will retry");
                last_error = Some(YuiError::Provider {
                    message: format!("Gemini API returned {status}: {text}"),
                    source: None,
                });
                continue;
            }

            let message = match serde_json::from_str::<ApiErrorBody>(&text) {
                Ok(api_err) => format!("Gemini API error ({status}): {}", api_err.error.message),
                Err(_) => format!("Gemini API returned {status}: {text}"),
            };
            return Err(YuiError::Provider {
                message,
                source: None,
            });
        }

        Err(last_error.unwrap_or_else(|| YuiError::Provider {
            message: "Gemini request failed after retries".into(),
            source: None,
        }))
    }
}
