// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profiles and aggregate statistics.

use rusqlite::params;

use yui_core::YuiError;

use crate::database::Database;
use crate::models::{UserProfile, UserStats};

fn row_to_profile(row: &rusqlite::Row) -> Result<UserProfile, rusqlite::Error> {
    Ok(UserProfile {
        user_name: row.get(0)?,
        preferences: row.get(1)?,
        created_at: row.get(2)?,
        last_seen: row.get(3)?,
    })
}

/// Get a user's profile, creating it on first interaction.
///
/// Exactly one profile exists per user name. Repeated calls update
/// `last_seen` and leave `created_at` untouched.
pub async fn get_or_create_profile(
    db: &Database,
    user_name: &str,
) -> Result<UserProfile, YuiError> {
    let user_name = user_name.to_string();
    let now = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let existing = {
                let mut stmt = tx.prepare(
                    "SELECT user_name, preferences, created_at, last_seen
                     FROM user_profiles WHERE user_name = ?1",
                )?;
                match stmt.query_row(params![user_name], row_to_profile) {
                    Ok(profile) => Some(profile),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                }
            };

            let profile = match existing {
                Some(mut profile) => {
                    tx.execute(
                        "UPDATE user_profiles SET last_seen = ?1 WHERE user_name = ?2",
                        params![now, user_name],
                    )?;
                    profile.last_seen = now;
                    profile
                }
                None => {
                    tx.execute(
                        "INSERT INTO user_profiles (user_name, preferences, created_at, last_seen)
                         VALUES (?1, '{}', ?2, ?2)",
                        params![user_name, now],
                    )?;
                    UserProfile {
                        user_name,
                        preferences: "{}".to_string(),
                        created_at: now.clone(),
                        last_seen: now,
                    }
                }
            };
            tx.commit()?;
            Ok(profile)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Overwrite a user's preferences blob. Last write wins.
pub async fn update_preferences(
    db: &Database,
    user_name: &str,
    preferences: &serde_json::Value,
) -> Result<(), YuiError> {
    let user_name = user_name.to_string();
    let preferences = preferences.to_string();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE user_profiles SET preferences = ?1 WHERE user_name = ?2",
                params![preferences, user_name],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Aggregate statistics for a user.
///
/// The favorite personality is the one with the most sessions; ties are
/// broken lexicographically on the personality name so the result does not
/// depend on storage iteration order.
pub async fn user_stats(db: &Database, user_name: &str) -> Result<UserStats, YuiError> {
    let user_name = user_name.to_string();

    db.connection()
        .call(move |conn| {
            let total_messages: i64 = conn.query_row(
                "SELECT COUNT(*) FROM conversations WHERE user_name = ?1",
                params![user_name],
                |row| row.get(0),
            )?;

            let total_sessions: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sessions WHERE user_name = ?1",
                params![user_name],
                |row| row.get(0),
            )?;

            let favorite_personality = {
                let result = conn.query_row(
                    "SELECT personality FROM sessions
                     WHERE user_name = ?1
                     GROUP BY personality
                     ORDER BY COUNT(*) DESC, personality ASC
                     LIMIT 1",
                    params![user_name],
                    |row| row.get::<_, String>(0),
                );
                match result {
                    Ok(p) => Some(p),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e.into()),
                }
            };

            Ok(UserStats {
                total_messages,
                total_sessions,
                favorite_personality,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::insert_message;
    use crate::queries::sessions::create_session;
    use yui_core::types::Role;

    #[tokio::test]
    async fn first_call_creates_profile() {
        let db = Database::open_in_memory().await.unwrap();
        let profile = get_or_create_profile(&db, "Alice").await.unwrap();
        assert_eq!(profile.user_name, "Alice");
        assert_eq!(profile.preferences, "{}");
        assert_eq!(profile.created_at, profile.last_seen);
    }

    #[tokio::test]
    async fn repeated_calls_keep_created_at_and_advance_last_seen() {
        let db = Database::open_in_memory().await.unwrap();
        let first = get_or_create_profile(&db, "Alice").await.unwrap();
        let second = get_or_create_profile(&db, "Alice").await.unwrap();

        assert_eq!(first.created_at, second.created_at);
        assert!(second.last_seen >= first.last_seen);

        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM user_profiles WHERE user_name = 'Alice'",
                    [],
                    |row| row.get(0),
                )?;
                Ok::<_, rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn preferences_overwrite_wins() {
        let db = Database::open_in_memory().await.unwrap();
        get_or_create_profile(&db, "Alice").await.unwrap();

        update_preferences(&db, "Alice", &serde_json::json!({"theme": "dark"}))
            .await
            .unwrap();
        update_preferences(&db, "Alice", &serde_json::json!({"theme": "light"}))
            .await
            .unwrap();

        let profile = get_or_create_profile(&db, "Alice").await.unwrap();
        let prefs: serde_json::Value = serde_json::from_str(&profile.preferences).unwrap();
        assert_eq!(prefs["theme"], "light");
    }

    #[tokio::test]
    async fn stats_count_messages_and_sessions() {
        let db = Database::open_in_memory().await.unwrap();
        create_session(&db, "s1", "Alice", "yui").await.unwrap();
        create_session(&db, "s2", "Alice", "yui").await.unwrap();
        create_session(&db, "s3", "Alice", "friday").await.unwrap();

        insert_message(&db, "s1", "Alice", "yui", Role::User, "hello", None)
            .await
            .unwrap();
        insert_message(&db, "s1", "Alice", "yui", Role::Assistant, "hi", None)
            .await
            .unwrap();

        let stats = user_stats(&db, "Alice").await.unwrap();
        assert_eq!(stats.total_messages, 2);
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.favorite_personality.as_deref(), Some("yui"));
    }

    #[tokio::test]
    async fn stats_tie_break_is_lexicographic() {
        let db = Database::open_in_memory().await.unwrap();
        create_session(&db, "s1", "Alice", "jarvis").await.unwrap();
        create_session(&db, "s2", "Alice", "friday").await.unwrap();

        // One session each: "friday" < "jarvis" lexicographically.
        let stats = user_stats(&db, "Alice").await.unwrap();
        assert_eq!(stats.favorite_personality.as_deref(), Some("friday"));
    }

    #[tokio::test]
    async fn stats_for_unknown_user_are_zero() {
        let db = Database::open_in_memory().await.unwrap();
        let stats = user_stats(&db, "nobody").await.unwrap();
        assert_eq!(stats.total_messages, 0);
        assert_eq!(stats.total_sessions, 0);
        assert!(stats.favorite_personality.is_none());
    }
}
