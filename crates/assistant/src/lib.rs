//! # TeamKB Assistant
//!
//! The retrieval-augmented answer pipeline:
//!
//! 1. [`Retriever`] pages through the note corpus
//! 2. [`build_prompt`] renders the grounded prompt
//! 3. a `teamkb_core::Generator` produces the raw reply
//! 4. [`Orchestrator`] validates the reply, applies the fallback policy,
//!    and finalizes the cursor

pub mod orchestrator;
pub mod prompt;
pub mod retriever;

#[cfg(test)]
mod test_helpers;

pub use orchestrator::{
    AssistantOutcome, Orchestrator, ParsedAnswer, PipelineState, ValidationOutcome, validate_reply,
};
pub use prompt::build_prompt;
pub use retriever::{NoteRetriever, RetrievalPage, Retriever};
