// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Yui companion agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Yui configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YuiConfig {
    /// Agent identity and behavior settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// LLM backend settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Semantic memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Web gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Personality active at startup.
    #[serde(default = "default_personality")]
    pub default_personality: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of recent turns kept in the live prompt window.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            default_personality: default_personality(),
            log_level: default_log_level(),
            history_window: default_history_window(),
        }
    }
}

fn default_agent_name() -> String {
    "yui".to_string()
}

fn default_personality() -> String {
    "yui".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_history_window() -> usize {
    20
}

/// LLM backend configuration.
///
/// The provider is chosen once at startup; per-call dispatch does not
/// exist. Supported providers: `groq`, `gemini`, `ollama`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Backend name: "groq", "gemini", or "ollama".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier. Empty string selects the provider's default.
    #[serde(default)]
    pub model: String,

    /// API key. `None` requires the provider-specific environment
    /// variable, or no key at all for local backends.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Maximum tokens to generate per response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature, 0.0-1.0.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: String::new(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "groq".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("yui").join("yui.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("yui.db"))
        .to_string_lossy()
        .into_owned()
}

/// Semantic memory configuration.
///
/// When disabled, or when the embedding backend fails to initialize,
/// retrieval degrades to keyword search over the relational store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the vector index. When false, keyword search only.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Name of the embedding model.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Download missing model files from HuggingFace on first run.
    /// When false, missing files disable the vector index instead.
    #[serde(default = "default_auto_download")]
    pub auto_download: bool,

    /// Timeout in seconds for model download requests.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Minimum cosine similarity for a fragment to be retrieved (0.0-1.0).
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Maximum number of fragments returned per semantic query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            model_name: default_model_name(),
            auto_download: default_auto_download(),
            download_timeout_secs: default_download_timeout_secs(),
            similarity_threshold: default_similarity_threshold(),
            max_results: default_max_results(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_auto_download() -> bool {
    true
}

fn default_download_timeout_secs() -> u64 {
    120
}

fn default_similarity_threshold() -> f32 {
    0.35
}

fn default_max_results() -> usize {
    5
}

/// Web gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// TCP port for the HTTP/WebSocket listener.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = YuiConfig::default();
        assert_eq!(config.agent.name, "yui");
        assert_eq!(config.agent.default_personality, "yui");
        assert_eq!(config.agent.history_window, 20);
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.max_tokens, 2048);
        assert!(config.memory.enabled);
        assert_eq!(config.memory.max_results, 5);
        assert_eq!(config.gateway.port, 8080);
    }

    #[test]
    fn database_path_is_not_empty() {
        let config = StorageConfig::default();
        assert!(!config.database_path.is_empty());
    }

    #[test]
    fn serde_roundtrip() {
        let config = YuiConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: YuiConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.agent.name, config.agent.name);
        assert_eq!(parsed.llm.provider, config.llm.provider);
    }
}
