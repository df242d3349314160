// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./yui.toml` > `~/.config/yui/yui.toml` >
//! `/etc/yui/yui.toml` with environment variable overrides via the
//! `YUI_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::YuiConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/yui/yui.toml` (system-wide)
/// 3. `~/.config/yui/yui.toml` (user XDG config)
/// 4. `./yui.toml` (local directory)
/// 5. `YUI_*` environment variables
pub fn load_config() -> Result<YuiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YuiConfig::default()))
        .merge(Toml::file("/etc/yui/yui.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("yui/yui.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("yui.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<YuiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YuiConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<YuiConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YuiConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `YUI_LLM_API_KEY` must map to
/// `llm.api_key`, not `llm.api.key`.
fn env_provider() -> Env {
    Env::prefixed("YUI_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("memory_", "memory.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_string_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [agent]
            name = "custom"
            history_window = 10

            [llm]
            provider = "ollama"
            "#,
        )
        .unwrap();

        assert_eq!(config.agent.name, "custom");
        assert_eq!(config.agent.history_window, 10);
        assert_eq!(config.llm.provider, "ollama");
        // Untouched sections keep compiled defaults.
        assert!(config.memory.enabled);
    }

    #[test]
    fn empty_string_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.agent.name, "yui");
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_config_from_str(
            r#"
            [agent]
            nmae = "typo"
            "#,
        );
        assert!(result.is_err(), "deny_unknown_fields should reject typos");
    }
}
