//! In-memory backend — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use teamkb_core::note::sort_newest_first;
use teamkb_core::{Note, NoteDraft, NoteStore, StoreError};
use tokio::sync::RwLock;

struct Inner {
    notes: Vec<Note>,
    next_id: i64,
}

/// An in-memory note store backed by a Vec.
pub struct InMemoryNoteStore {
    inner: RwLock<Inner>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::with_notes(Vec::new())
    }

    /// Seed the store with existing notes (ids and timestamps kept as given).
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let next_id = notes.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        Self {
            inner: RwLock::new(Inner { notes, next_id }),
        }
    }

    /// Insert a fully formed note, replacing any note with the same id.
    pub async fn insert(&self, note: Note) {
        let mut inner = self.inner.write().await;
        inner.next_id = inner.next_id.max(note.id + 1);
        inner.notes.retain(|n| n.id != note.id);
        inner.notes.push(note);
    }
}

impl Default for InMemoryNoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_all_notes(&self) -> Result<Vec<Note>, StoreError> {
        let mut notes = self.inner.read().await.notes.clone();
        sort_newest_first(&mut notes);
        Ok(notes)
    }

    async fn get(&self, id: i64) -> Result<Option<Note>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn create(&self, draft: NoteDraft) -> Result<Note, StoreError> {
        draft.validate()?;
        let mut inner = self.inner.write().await;
        let note = Note {
            id: inner.next_id,
            title: Some(draft.title),
            content: draft.content,
            created_at: Utc::now(),
        };
        inner.next_id += 1;
        inner.notes.push(note.clone());
        Ok(note)
    }

    async fn update(&self, id: i64, draft: NoteDraft) -> Result<bool, StoreError> {
        draft.validate()?;
        let mut inner = self.inner.write().await;
        match inner.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => {
                note.title = Some(draft.title);
                note.content = draft.content;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let len_before = inner.notes.len();
        inner.notes.retain(|n| n.id != id);
        Ok(inner.notes.len() < len_before)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.inner.read().await.notes.len())
    }
}
