// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed fragment store: the per-user vector namespace.
//!
//! Embeddings are stored as little-endian f32 BLOBs. Every query filters
//! on `user_name` -- that column is the namespace boundary, so fragments
//! indexed for one user can never surface in another user's results.
//! Fragments are append-only and independently keyed, so concurrent
//! writers for the same user need no coordination.

use rusqlite::params;
use tokio_rusqlite::Connection;

use yui_core::YuiError;

use crate::types::{MemoryFragment, blob_to_vec, vec_to_blob};

fn index_err(e: tokio_rusqlite::Error) -> YuiError {
    YuiError::SemanticIndex {
        message: "fragment store query failed".to_string(),
        source: Some(Box::new(e)),
    }
}

/// Persistent store for memory fragments.
///
/// Holds its own connection, separate from the relational store's writer
/// thread: a failure here never touches a committed relational write.
pub struct FragmentStore {
    conn: Connection,
}

impl FragmentStore {
    /// Wraps an existing connection. The `memory_fragments` table must
    /// already exist (migrations run on `Database::open`).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens a store over the given database file.
    pub async fn open(path: &str) -> Result<Self, YuiError> {
        let conn = Connection::open(path).await.map_err(index_err)?;
        Ok(Self::new(conn))
    }

    /// Insert a fragment. Fragments are never updated or deleted.
    pub async fn insert(&self, fragment: &MemoryFragment) -> Result<(), YuiError> {
        let f = fragment.clone();
        let embedding_blob = vec_to_blob(&f.embedding);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO memory_fragments
                       (id, user_name, session_id, personality, content, embedding, emotion, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        f.id,
                        f.user_name,
                        f.session_id,
                        f.personality,
                        f.content,
                        embedding_blob,
                        f.emotion,
                        f.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(index_err)
    }

    /// All (id, embedding) pairs in one user's namespace.
    pub async fn embeddings_for(
        &self,
        user_name: &str,
    ) -> Result<Vec<(String, Vec<f32>)>, YuiError> {
        let user_name = user_name.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, embedding FROM memory_fragments WHERE user_name = ?1",
                )?;
                let pairs = stmt
                    .query_map(params![user_name], |row| {
                        let id: String = row.get(0)?;
                        let blob: Vec<u8> = row.get(1)?;
                        Ok((id, blob_to_vec(&blob)))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(pairs)
            })
            .await
            .map_err(index_err)
    }

    /// Batch retrieval by id, still scoped to the user's namespace.
    pub async fn fragments_by_ids(
        &self,
        user_name: &str,
        ids: &[String],
    ) -> Result<Vec<MemoryFragment>, YuiError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let user_name = user_name.to_string();
        let ids = ids.to_vec();
        self.conn
            .call(move |conn| {
                let placeholders: Vec<String> =
                    (2..=ids.len() + 1).map(|i| format!("?{i}")).collect();
                let sql = format!(
                    "SELECT id, user_name, session_id, personality, content, embedding, emotion, created_at
                     FROM memory_fragments
                     WHERE user_name = ?1 AND id IN ({})",
                    placeholders.join(", ")
                );
                let mut stmt = conn.prepare(&sql)?;

                let mut bindings: Vec<&dyn rusqlite::types::ToSql> = vec![&user_name];
                bindings.extend(ids.iter().map(|id| id as &dyn rusqlite::types::ToSql));

                let fragments = stmt
                    .query_map(bindings.as_slice(), |row| {
                        let blob: Vec<u8> = row.get(5)?;
                        Ok(MemoryFragment {
                            id: row.get(0)?,
                            user_name: row.get(1)?,
                            session_id: row.get(2)?,
                            personality: row.get(3)?,
                            content: row.get(4)?,
                            embedding: blob_to_vec(&blob),
                            emotion: row.get(6)?,
                            created_at: row.get(7)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(fragments)
            })
            .await
            .map_err(index_err)
    }

    /// Number of fragments in one user's namespace.
    pub async fn count_for(&self, user_name: &str) -> Result<i64, YuiError> {
        let user_name = user_name.to_string();
        self.conn
            .call(move |conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM memory_fragments WHERE user_name = ?1",
                    params![user_name],
                    |row| row.get(0),
                )?;
                Ok(n)
            })
            .await
            .map_err(index_err)
    }
}

#[cfg(test)]
pub(crate) async fn store_in_memory() -> FragmentStore {
    let conn = Connection::open_in_memory().await.unwrap();
    conn.call(|conn| {
        conn.execute_batch(
            "CREATE TABLE memory_fragments (
                id TEXT PRIMARY KEY NOT NULL,
                user_name TEXT NOT NULL,
                session_id TEXT NOT NULL,
                personality TEXT NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                emotion TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX idx_fragments_user ON memory_fragments(user_name);",
        )?;
        Ok(())
    })
    .await
    .unwrap();
    FragmentStore::new(conn)
}
