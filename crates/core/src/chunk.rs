//! Retrieval chunks: the unit of context handed to the prompt builder.

use serde::{Deserialize, Serialize};

use crate::note::Note;

/// Source label used when a note has no title.
pub const UNTITLED_SOURCE: &str = "Untitled Note";

/// Text used when a note has no content.
pub const EMPTY_TEXT: &str = "No content available";

/// One retrievable unit of knowledge (currently one per note).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalChunk {
    /// Unique within a single retrieval call
    pub id: String,

    /// The page token this chunk was retrieved under
    pub cursor: String,

    /// Human-readable provenance label
    pub source: String,

    /// The chunk text
    pub text: String,
}

impl RetrievalChunk {
    /// Build the chunk for a note, tagged with the page token it was
    /// retrieved under.
    pub fn from_note(note: &Note, cursor: impl Into<String>) -> Self {
        let source = note
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(UNTITLED_SOURCE);

        Self {
            id: note.id.to_string(),
            cursor: cursor.into(),
            source: source.to_string(),
            text: note.content.clone().unwrap_or_else(|| EMPTY_TEXT.to_string()),
        }
    }
}
