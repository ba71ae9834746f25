//! # TeamKB Core
//!
//! Domain types, traits, and error definitions for the TeamKB knowledge
//! assistant. This crate has **no framework dependencies**: it defines the
//! domain model that the store, provider, assistant, and gateway crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the assistant pipeline is a trait here:
//! - [`NoteStore`] is the persistence capability (list notes newest first,
//!   plus the CRUD surface)
//! - [`Generator`] is the language-generation backend
//!
//! Implementations live in their respective crates, so each stage of the
//! pipeline can be exercised in isolation with substitutes.

pub mod chunk;
pub mod cursor;
pub mod error;
pub mod generation;
pub mod message;
pub mod note;
pub mod response;

// Re-export key types at crate root for ergonomics
pub use chunk::RetrievalChunk;
pub use cursor::{Cursor, KeysetBoundary};
pub use error::{CursorError, Error, GenerationError, Result, StoreError};
pub use generation::Generator;
pub use message::{Message, Role};
pub use note::{Note, NoteDraft, NoteStore};
pub use response::{AssistantRequest, AssistantResponse};
