// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock LLM provider adapters for deterministic testing.
//!
//! `MockProvider` returns pre-configured responses and records every
//! request it sees, enabling fast, CI-runnable tests without external API
//! calls. `FailingProvider` fails every call, for exercising the textual
//! error boundary.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use yui_core::YuiError;
use yui_core::traits::adapter::PluginAdapter;
use yui_core::traits::provider::ProviderAdapter;
use yui_core::types::{AdapterType, HealthStatus, ProviderRequest};

/// A mock LLM provider with a FIFO response queue.
///
/// When the queue is empty, a default "mock response" text is returned.
/// Every request is recorded for later assertions.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    /// Create a mock provider with an empty response queue.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: String) {
        self.responses.lock().await.push_back(text);
    }

    /// All requests seen so far, in call order.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    /// The most recent request, if any.
    pub async fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().await.last().cloned()
    }

    async fn next_response(&self) -> String {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "mock response".to_string())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
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
impl ProviderAdapter for MockProvider {
    async fn generate(&self, request: ProviderRequest) -> Result<String, YuiError> {
        self.requests.lock().await.push(request);
        Ok(self.next_response().await)
    }
}

/// A provider that fails every call.
pub struct FailingProvider;

#[async_trait]
impl PluginAdapter for FailingProvider {
    fn name(&self) -> &str {
        "failing-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, YuiError> {
        Ok(HealthStatus::Unhealthy("always fails".into()))
    }

    async fn shutdown(&self) -> Result<(), YuiError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for FailingProvider {
    async fn generate(&self, _request: ProviderRequest) -> Result<String, YuiError> {
        Err(YuiError::Provider {
            message: "backend is down".into(),
            source: None,
        })
    }
}
