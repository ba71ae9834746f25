//! Shared test helpers for pipeline tests.

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Mutex;
use teamkb_core::error::Result;
use teamkb_core::{Error, GenerationError, Generator, Note, NoteDraft, NoteStore, StoreError};

use crate::retriever::{RetrievalPage, Retriever};

/// A note created `i` minutes after a fixed base time, titled `Note {i}`.
pub fn note_at(i: i64) -> Note {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    Note {
        id: i,
        title: Some(format!("Note {i}")),
        content: Some(format!("Content of note {i}")),
        created_at: base + Duration::minutes(i),
    }
}

/// A generator that returns a fixed completion and records every prompt.
pub struct ScriptedGenerator {
    reply: std::result::Result<String, GenerationError>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: GenerationError) -> Self {
        Self {
            reply: Err(error),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

/// A generator whose backend call panics.
pub struct PanickingGenerator;

#[async_trait]
impl Generator for PanickingGenerator {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn complete(&self, _prompt: &str) -> std::result::Result<String, GenerationError> {
        panic!("backend client bug");
    }
}

/// A retriever that raises instead of degrading.
pub struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str, _cursor: Option<&str>) -> Result<RetrievalPage> {
        Err(Error::Internal("retriever exploded".into()))
    }
}

/// A store whose every operation fails.
pub struct FailingStore;

#[async_trait]
impl NoteStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn list_all_notes(&self) -> std::result::Result<Vec<Note>, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn get(&self, _id: i64) -> std::result::Result<Option<Note>, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn create(&self, _draft: NoteDraft) -> std::result::Result<Note, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn update(&self, _id: i64, _draft: NoteDraft) -> std::result::Result<bool, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn delete(&self, _id: i64) -> std::result::Result<bool, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }

    async fn count(&self) -> std::result::Result<usize, StoreError> {
        Err(StoreError::Unavailable("database is locked".into()))
    }
}

/// A read-only store that returns its notes in whatever order it was given.
pub struct UnorderedStore(pub Vec<Note>);

#[async_trait]
impl NoteStore for UnorderedStore {
    fn name(&self) -> &str {
        "unordered"
    }

    async fn list_all_notes(&self) -> std::result::Result<Vec<Note>, StoreError> {
        Ok(self.0.clone())
    }

    async fn get(&self, id: i64) -> std::result::Result<Option<Note>, StoreError> {
        Ok(self.0.iter().find(|n| n.id == id).cloned())
    }

    async fn create(&self, _draft: NoteDraft) -> std::result::Result<Note, StoreError> {
        Err(StoreError::Unavailable("read-only".into()))
    }

    async fn update(&self, _id: i64, _draft: NoteDraft) -> std::result::Result<bool, StoreError> {
        Err(StoreError::Unavailable("read-only".into()))
    }

    async fn delete(&self, _id: i64) -> std::result::Result<bool, StoreError> {
        Err(StoreError::Unavailable("read-only".into()))
    }

    async fn count(&self) -> std::result::Result<usize, StoreError> {
        Ok(self.0.len())
    }
}
