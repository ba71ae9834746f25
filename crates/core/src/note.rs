//! Notes and the note store capability.
//!
//! A note is the raw unit of team knowledge. The assistant pipeline only
//! needs [`NoteStore::list_all_notes`]; the remaining operations back the
//! notes surface of the HTTP API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cursor::KeysetBoundary;
use crate::error::StoreError;

/// Maximum length of a note title, in characters.
pub const MAX_TITLE_CHARS: usize = 200;

/// Maximum length of a note body, in characters.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// A stored note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned identifier, unique within the corpus
    pub id: i64,

    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,

    /// Free-text body
    #[serde(default)]
    pub content: Option<String>,

    /// When the note was created
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// The position of this note in newest-first order.
    pub fn boundary(&self) -> KeysetBoundary {
        KeysetBoundary {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

/// Input for creating or replacing a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,

    #[serde(default)]
    pub content: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: Option<String>) -> Self {
        Self {
            title: title.into(),
            content,
        }
    }

    /// Check the draft against the note constraints.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.title.trim().is_empty() {
            return Err(StoreError::Validation("title is required".into()));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(StoreError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        if let Some(content) = &self.content {
            if content.chars().count() > MAX_CONTENT_CHARS {
                return Err(StoreError::Validation(format!(
                    "content must be at most {MAX_CONTENT_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

/// Sort notes newest first (`created_at` descending, then `id` descending).
pub fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

/// The note persistence capability.
///
/// Implementations: SQLite, in-memory (for tests and ephemeral runs).
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Every note, newest first. Each call sees a consistent snapshot.
    async fn list_all_notes(&self) -> Result<Vec<Note>, StoreError>;

    /// Get a note by ID.
    async fn get(&self, id: i64) -> Result<Option<Note>, StoreError>;

    /// Validate and store a new note, returning it with its assigned ID.
    async fn create(&self, draft: NoteDraft) -> Result<Note, StoreError>;

    /// Replace the title and content of a note. Returns `false` if missing.
    async fn update(&self, id: i64, draft: NoteDraft) -> Result<bool, StoreError>;

    /// Delete a note by ID. Returns `false` if missing.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Total number of notes.
    async fn count(&self) -> Result<usize, StoreError>;
}
