// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle operations.

use rusqlite::params;

use yui_core::YuiError;

use crate::database::Database;
use crate::models::SessionRecord;

fn row_to_session(row: &rusqlite::Row) -> Result<SessionRecord, rusqlite::Error> {
    Ok(SessionRecord {
        session_id: row.get(0)?,
        user_name: row.get(1)?,
        personality: row.get(2)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        message_count: row.get(5)?,
    })
}

/// Create a new session.
///
/// Idempotent: a duplicate session identifier is silently ignored rather
/// than treated as a conflict, since callers may retry creation during
/// reconnects.
pub async fn create_session(
    db: &Database,
    session_id: &str,
    user_name: &str,
    personality: &str,
) -> Result<(), YuiError> {
    let session_id = session_id.to_string();
    let user_name = user_name.to_string();
    let personality = personality.to_string();
    let started_at = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO sessions (session_id, user_name, personality, started_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![session_id, user_name, personality, started_at],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark a session as ended.
///
/// The end timestamp is advisory: calling this on a non-existent or
/// already-ended session is a no-op.
pub async fn end_session(db: &Database, session_id: &str) -> Result<(), YuiError> {
    let session_id = session_id.to_string();
    let ended_at = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE sessions SET ended_at = ?1
                 WHERE session_id = ?2 AND ended_at IS NULL",
                params![ended_at, session_id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a session by ID.
pub async fn get_session(
    db: &Database,
    session_id: &str,
) -> Result<Option<SessionRecord>, YuiError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT session_id, user_name, personality, started_at, ended_at, message_count
                 FROM sessions WHERE session_id = ?1",
            )?;
            let result = stmt.query_row(params![session_id], row_to_session);
            match result {
                Ok(session) => Ok(Some(session)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_and_get_session() {
        let db = Database::open_in_memory().await.unwrap();
        create_session(&db, "sess-1", "alice", "yui").await.unwrap();

        let session = get_session(&db, "sess-1").await.unwrap().unwrap();
        assert_eq!(session.session_id, "sess-1");
        assert_eq!(session.user_name, "alice");
        assert_eq!(session.personality, "yui");
        assert_eq!(session.message_count, 0);
        assert!(session.ended_at.is_none());
    }

    #[tokio::test]
    async fn get_nonexistent_session_returns_none() {
        let db = Database::open_in_memory().await.unwrap();
        let result = get_session(&db, "no-such-session").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn duplicate_create_is_a_noop() {
        let db = Database::open_in_memory().await.unwrap();
        create_session(&db, "sess-dup", "alice", "yui").await.unwrap();
        // Second create under the same id, even with different attributes,
        // must neither error nor overwrite.
        create_session(&db, "sess-dup", "alice", "friday").await.unwrap();

        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM sessions WHERE session_id = 'sess-dup'",
                    [],
                    |row| row.get(0),
                )?;
                Ok::<_, rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 1);

        let session = get_session(&db, "sess-dup").await.unwrap().unwrap();
        assert_eq!(session.personality, "yui");
    }

    #[tokio::test]
    async fn end_session_sets_timestamp_once() {
        let db = Database::open_in_memory().await.unwrap();
        create_session(&db, "sess-end", "alice", "yui").await.unwrap();

        end_session(&db, "sess-end").await.unwrap();
        let first = get_session(&db, "sess-end").await.unwrap().unwrap();
        let ended_at = first.ended_at.clone().unwrap();

        // Ending again is a no-op: the original timestamp is preserved.
        end_session(&db, "sess-end").await.unwrap();
        let second = get_session(&db, "sess-end").await.unwrap().unwrap();
        assert_eq!(second.ended_at.as_deref(), Some(ended_at.as_str()));
    }

    #[tokio::test]
    async fn end_nonexistent_session_is_a_noop() {
        let db = Database::open_in_memory().await.unwrap();
        end_session(&db, "ghost").await.unwrap();
    }
}
