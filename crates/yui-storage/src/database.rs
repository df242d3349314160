// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access goes through tokio-rusqlite's single background thread, which
//! serializes writes. Within one session this is what keeps message
//! timestamps non-decreasing: successive `save_message` calls are applied
//! in invocation order. Do NOT create additional Connection instances for
//! writes to the relational tables.

use std::path::Path;

use tokio_rusqlite::Connection;
use tracing::debug;

use yui_core::YuiError;

use crate::migrations;

/// Converts a tokio-rusqlite error into the fatal persistence variant.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> YuiError {
    YuiError::Persistence {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database backing the relational store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens (or creates) the database at `path`, applies PRAGMAs, and runs
    /// embedded migrations.
    ///
    /// The parent directory is created if missing. Fails with
    /// [`YuiError::Persistence`] if the file cannot be opened -- the
    /// relational store is mandatory, so this error propagates.
    pub async fn open(path: &str) -> Result<Self, YuiError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(YuiError::persistence)?;
        }

        let conn = Connection::open(path).await.map_err(YuiError::persistence)?;
        let db = Self::configure(conn).await?;
        debug!(path, "database opened");
        Ok(db)
    }

    /// Opens an in-memory database with the full schema applied.
    pub async fn open_in_memory() -> Result<Self, YuiError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(YuiError::persistence)?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self, YuiError> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(YuiError::persistence)?;

        Ok(Self { conn })
    }

    /// Returns the underlying connection for query modules.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(&self) -> Result<(), YuiError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_parent_dirs() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("yui.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        assert!(db_path.exists());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn open_in_memory_has_schema() {
        let db = Database::open_in_memory().await.unwrap();
        let count: i64 = db
            .connection()
            .call(|conn| {
                let n = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master
                     WHERE type = 'table' AND name IN
                       ('conversations', 'sessions', 'user_profiles', 'memory_fragments')",
                    [],
                    |row| row.get(0),
                )?;
                Ok::<_, rusqlite::Error>(n)
            })
            .await
            .unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("reopen.db");
        let path = db_path.to_str().unwrap();

        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
        drop(db);

        // Second open must not fail on already-applied migrations.
        let db = Database::open(path).await.unwrap();
        db.close().await.unwrap();
    }
}
