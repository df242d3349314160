// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM provider adapters for the Yui companion agent.
//!
//! Each backend is a thin request/response translator behind
//! [`ProviderAdapter`]: format the wire request, parse the reply into
//! plain text, map failures to [`YuiError::Provider`]. The concrete
//! backend is chosen exactly once, at construction, from configuration.

pub mod gemini;
pub mod groq;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

use yui_config::model::LlmConfig;
use yui_core::{ProviderAdapter, YuiError};

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use ollama::OllamaProvider;

/// Returns true for HTTP statuses worth one retry.
pub(crate) fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

/// Resolves an API key from config or an environment variable.
pub(crate) fn resolve_api_key(
    configured: Option<&str>,
    env_var: &str,
    provider: &str,
) -> Result<String, YuiError> {
    configured
        .map(|k| k.to_string())
        .or_else(|| std::env::var(env_var).ok())
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            YuiError::Config(format!(
                "no API key for {provider}: set llm.api_key or the {env_var} environment variable"
            ))
        })
}

/// Builds the configured provider.
///
/// The set is closed: `groq`, `gemini`, `ollama`. An empty `llm.model`
/// selects the backend's default model.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn ProviderAdapter>, YuiError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let model = config.model.trim();

    match config.provider.as_str() {
        "groq" => {
            let api_key = resolve_api_key(config.api_key.as_deref(), "GROQ_API_KEY", "groq")?;
            Ok(Arc::new(GroqProvider::new(api_key, model, timeout)?))
        }
        "gemini" => {
            let api_key = resolve_api_key(config.api_key.as_deref(), "GEMINI_API_KEY", "gemini")?;
            Ok(Arc::new(GeminiProvider::new(api_key, model, timeout)?))
        }
        "ollama" => Ok(Arc::new(OllamaProvider::new(model, timeout)?)),
        other => Err(YuiError::Config(format!(
            "unknown LLM provider `{other}` (expected groq, gemini, or ollama)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yui_core::PluginAdapter;

    #[test]
    fn unknown_provider_is_a_config_error() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            ..LlmConfig::default()
        };
        let err = create_provider(&config).unwrap_err();
        assert!(matches!(err, YuiError::Config(_)));
    }

    #[test]
    fn ollama_needs_no_api_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn groq_key_comes_from_config() {
        let config = LlmConfig {
            provider: "groq".to_string(),
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn transient_statuses() {
        use reqwest::StatusCode;
        assert!(is_transient_error(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_transient_error(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_transient_error(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_transient_error(StatusCode::BAD_REQUEST));
        assert!(!is_transient_error(StatusCode::UNAUTHORIZED));
    }
}
