// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message insert and history queries.

use rusqlite::params;

use yui_core::YuiError;
use yui_core::types::Role;

use crate::database::Database;
use crate::models::MessageRecord;

fn row_to_message(row: &rusqlite::Row) -> Result<MessageRecord, rusqlite::Error> {
    Ok(MessageRecord {
        id: row.get(0)?,
        session_id: row.get(1)?,
        user_name: row.get(2)?,
        personality: row.get(3)?,
        role: row.get(4)?,
        content: row.get(5)?,
        timestamp: row.get(6)?,
        emotion: row.get(7)?,
    })
}

const MESSAGE_COLUMNS: &str =
    "id, session_id, user_name, personality, role, content, timestamp, emotion";

/// Insert a message and increment the owning session's message count.
///
/// Both statements run in one transaction: the counter is never lost or
/// double-applied relative to the row insert, even under a crash between
/// calls. The timestamp is minted here as RFC 3339 UTC.
pub async fn insert_message(
    db: &Database,
    session_id: &str,
    user_name: &str,
    personality: &str,
    role: Role,
    content: &str,
    emotion: Option<&str>,
) -> Result<(), YuiError> {
    let session_id = session_id.to_string();
    let user_name = user_name.to_string();
    let personality = personality.to_string();
    let role = role.as_str();
    let content = content.to_string();
    let emotion = emotion.map(|e| e.to_string());
    let timestamp = chrono::Utc::now().to_rfc3339();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO conversations
                   (session_id, user_name, personality, role, content, timestamp, emotion)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![session_id, user_name, personality, role, content, timestamp, emotion],
            )?;
            tx.execute(
                "UPDATE sessions SET message_count = message_count + 1
                 WHERE session_id = ?1",
                params![session_id],
            )?;
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get the most recent `limit` messages of a session, oldest first.
///
/// Returns an empty vec (not an error) when the session has no messages.
/// Ties on timestamp are broken by insert order via the rowid.
pub async fn session_history(
    db: &Database,
    session_id: &str,
    limit: i64,
) -> Result<Vec<MessageRecord>, YuiError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM
                   (SELECT {MESSAGE_COLUMNS} FROM conversations
                    WHERE session_id = ?1
                    ORDER BY timestamp DESC, id DESC LIMIT ?2)
                 ORDER BY timestamp ASC, id ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let messages = stmt
                .query_map(params![session_id, limit], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Cross-session history for a user, newest first.
pub async fn user_history(
    db: &Database,
    user_name: &str,
    limit: i64,
) -> Result<Vec<MessageRecord>, YuiError> {
    let user_name = user_name.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM conversations
                 WHERE user_name = ?1
                 ORDER BY timestamp DESC, id DESC LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let messages = stmt
                .query_map(params![user_name, limit], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Substring search over a user's messages, newest first.
///
/// This is the fallback path when the semantic index is unavailable.
pub async fn search_conversations(
    db: &Database,
    user_name: &str,
    keyword: &str,
    limit: i64,
) -> Result<Vec<MessageRecord>, YuiError> {
    let user_name = user_name.to_string();
    let pattern = format!("%{keyword}%");
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM conversations
                 WHERE user_name = ?1 AND content LIKE ?2
                 ORDER BY timestamp DESC, id DESC LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let messages = stmt
                .query_map(params![user_name, pattern, limit], row_to_message)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
