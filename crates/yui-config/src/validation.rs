// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all errors instead of failing fast.

use crate::model::YuiConfig;

/// Providers accepted by `llm.provider`.
pub const KNOWN_PROVIDERS: &[&str] = &["groq", "gemini", "ollama"];

/// A single configuration validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or every collected error.
pub fn validate_config(config: &YuiConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let provider = config.llm.provider.trim();
    if !KNOWN_PROVIDERS.contains(&provider) {
        errors.push(ConfigError::new(format!(
            "llm.provider `{provider}` is not supported (expected one of: {})",
            KNOWN_PROVIDERS.join(", ")
        )));
    }

    if !(0.0..=1.0).contains(&config.llm.temperature) {
        errors.push(ConfigError::new(format!(
            "llm.temperature must be between 0.0 and 1.0, got {}",
            config.llm.temperature
        )));
    }

    if config.llm.max_tokens == 0 {
        errors.push(ConfigError::new("llm.max_tokens must be greater than 0"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::new("storage.database_path must not be empty"));
    }

    if !(0.0..=1.0).contains(&config.memory.similarity_threshold) {
        errors.push(ConfigError::new(format!(
            "memory.similarity_threshold must be between 0.0 and 1.0, got {}",
            config.memory.similarity_threshold
        )));
    }

    if config.memory.max_results == 0 {
        errors.push(ConfigError::new("memory.max_results must be greater than 0"));
    }

    if config.agent.history_window == 0 {
        errors.push(ConfigError::new("agent.history_window must be greater than 0"));
    }

    {
        let addr = config.gateway.bind_address.trim();
        if addr.is_empty() {
            errors.push(ConfigError::new("gateway.bind_address must not be empty"));
        } else {
            let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
            let is_valid_hostname = addr
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
            if !is_valid_ip && !is_valid_hostname {
                errors.push(ConfigError::new(format!(
                    "gateway.bind_address `{addr}` is not a valid IP address or hostname"
                )));
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Render collected validation errors to stderr.
pub fn render_errors(errors: &[ConfigError]) {
    eprintln!("yui: configuration is invalid:");
    for error in errors {
        eprintln!("  - {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = YuiConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut config = YuiConfig::default();
        config.llm.provider = "openai".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("llm.provider"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = YuiConfig::default();
        config.llm.provider = "nope".to_string();
        config.llm.temperature = 3.0;
        config.storage.database_path = "  ".to_string();
        config.memory.max_results = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = YuiConfig::default();
        config.memory.similarity_threshold = -0.1;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("similarity_threshold"));
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        let mut config = YuiConfig::default();
        config.gateway.bind_address = "not a host!".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("bind_address"));
    }
}
