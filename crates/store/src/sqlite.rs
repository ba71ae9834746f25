//! SQLite note store.
//!
//! A single `notes` table with an integer primary key. Timestamps are stored
//! as fixed-width RFC 3339 strings (UTC, nanosecond precision), so the text
//! ordering of `created_at` matches chronological ordering.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use teamkb_core::{Note, NoteDraft, NoteStore, StoreError};
use tracing::{debug, info};

/// A production SQLite note store.
pub struct SqliteNoteStore {
    pool: SqlitePool,
}

impl SqliteNoteStore {
    /// Open (and create if missing) a SQLite database.
    ///
    /// Pass `"sqlite::memory:"` for an ephemeral database (useful for tests).
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Unavailable(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // An in-memory database lives and dies with its connection.
        let max_connections = if url.contains(":memory:") { 1 } else { 4 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!(notes = store.count().await?, "SQLite note store initialized at {url}");
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT,
                content     TEXT,
                created_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("notes table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_notes_created_at ON notes(created_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_note(row: &sqlx::sqlite::SqliteRow) -> Result<Note, StoreError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| StoreError::Corrupt(format!("id column: {e}")))?;
        let title: Option<String> = row
            .try_get("title")
            .map_err(|e| StoreError::Corrupt(format!("title column: {e}")))?;
        let content: Option<String> = row
            .try_get("content")
            .map_err(|e| StoreError::Corrupt(format!("content column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| StoreError::Corrupt(format!("created_at column: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::Corrupt(format!("note {id} created_at '{created_at_str}': {e}")))?;

        Ok(Note {
            id,
            title,
            content,
            created_at,
        })
    }
}

#[async_trait]
impl NoteStore for SqliteNoteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list_all_notes(&self) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query("SELECT * FROM notes ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("List notes: {e}")))?;

        rows.iter().map(Self::row_to_note).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query("SELECT * FROM notes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("Get note: {e}")))?;

        row.as_ref().map(Self::row_to_note).transpose()
    }

    async fn create(&self, draft: NoteDraft) -> Result<Note, StoreError> {
        draft.validate()?;
        let created_at = Utc::now();

        let result = sqlx::query("INSERT INTO notes (title, content, created_at) VALUES (?1, ?2, ?3)")
            .bind(&draft.title)
            .bind(&draft.content)
            .bind(created_at.to_rfc3339_opts(SecondsFormat::Nanos, true))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("INSERT failed: {e}")))?;

        let id = result.last_insert_rowid();
        debug!("Stored note {id}");

        Ok(Note {
            id,
            title: Some(draft.title),
            content: draft.content,
            created_at,
        })
    }

    async fn update(&self, id: i64, draft: NoteDraft) -> Result<bool, StoreError> {
        draft.validate()?;

        let result = sqlx::query("UPDATE notes SET title = ?1, content = ?2 WHERE id = ?3")
            .bind(&draft.title)
            .bind(&draft.content)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("UPDATE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("DELETE failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM notes")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable(format!("COUNT failed: {e}")))?;

        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::Corrupt(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}
