// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.

use serde::{Deserialize, Serialize};

/// One turn of a conversation, as stored.
///
/// Immutable once written: there is no update path, only insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub session_id: String,
    pub user_name: String,
    pub personality: String,
    pub role: String,
    pub content: String,
    /// RFC 3339 UTC; non-decreasing within a session.
    pub timestamp: String,
    /// Detected emotion label; set only for user-role messages.
    pub emotion: Option<String>,
}

/// One continuous conversation thread between a user and a personality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_name: String,
    pub personality: String,
    pub started_at: String,
    /// Advisory: stays NULL if the process exits without closing.
    pub ended_at: Option<String>,
    pub message_count: i64,
}

/// One record per distinct user name, created lazily on first interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_name: String,
    /// Opaque JSON blob.
    pub preferences: String,
    pub created_at: String,
    pub last_seen: String,
}

/// Aggregate statistics for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_messages: i64,
    pub total_sessions: i64,
    /// Personality with the most sessions; ties break lexicographically.
    /// `None` when the user has no sessions yet.
    pub favorite_personality: Option<String>,
}
