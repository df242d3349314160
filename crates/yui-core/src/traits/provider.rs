// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for LLM backends (Groq, Gemini, Ollama).

use async_trait::async_trait;

use crate::error::YuiError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ProviderRequest;

/// Adapter for LLM provider integrations.
///
/// The concrete backend is chosen once at construction from configuration;
/// callers hold a trait object and never dispatch per call. The returned
/// text is opaque to the rest of the system.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the generated text.
    async fn generate(&self, request: ProviderRequest) -> Result<String, YuiError>;
}
