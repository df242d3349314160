// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `yui serve` command implementation.

use yui_config::YuiConfig;
use yui_core::YuiError;

/// Starts the web gateway with the configured provider.
pub async fn run_serve(config: YuiConfig) -> Result<(), YuiError> {
    let provider = yui_llm::create_provider(&config.llm)?;
    yui_gateway::serve(config, provider).await
}
