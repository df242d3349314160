// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `yui stats` command implementation.
//!
//! Reads the relational store directly: no provider, no vector index.

use yui_config::YuiConfig;
use yui_core::YuiError;
use yui_storage::Database;
use yui_storage::queries::profiles;

/// Prints aggregate statistics for one user.
pub async fn run_stats(config: YuiConfig, user: &str) -> Result<(), YuiError> {
    let db = Database::open(&config.storage.database_path).await?;
    let stats = profiles::user_stats(&db, user).await?;

    println!("user: {user}");
    println!("messages: {}", stats.total_messages);
    println!("sessions: {}", stats.total_sessions);
    println!(
        "favorite personality: {}",
        stats.favorite_personality.as_deref().unwrap_or("none")
    );

    db.close().await
}
