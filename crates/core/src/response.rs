//! The assistant's request and response shapes.
//!
//! [`AssistantResponse`] is the only externally observable result of a
//! question. It is always fully populated, including on failure.

use serde::{Deserialize, Serialize};

/// Answer used when the backend's reply cannot be trusted.
pub const FALLBACK_ANSWER: &str = "I don't know";

/// Follow-up suggested alongside the fallback answer.
pub const FALLBACK_FOLLOW_UP: &str = "Try show more";

/// Answer used when the pipeline itself failed.
pub const FAILURE_ANSWER: &str = "I encountered an error while processing your request.";

/// Follow-up suggested alongside the failure answer.
pub const FAILURE_FOLLOW_UP: &str = "Please try again later.";

/// An inbound question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    /// The user's question
    pub query: String,

    /// Prior user utterances, oldest first
    #[serde(default)]
    pub conversation_history: Vec<String>,

    /// Continuation token from a previous response
    #[serde(default)]
    pub cursor: Option<String>,
}

/// A structured, grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub answer: String,
    pub citations: Vec<String>,
    pub next_cursor: Option<String>,
    pub follow_up: String,
}

impl AssistantResponse {
    /// The fixed answer for untrusted backend output. Keeps the retriever's
    /// cursor so pagination continues.
    pub fn fallback(next_cursor: Option<String>) -> Self {
        Self {
            answer: FALLBACK_ANSWER.into(),
            citations: Vec::new(),
            next_cursor,
            follow_up: FALLBACK_FOLLOW_UP.into(),
        }
    }

    /// The fixed answer for an internal failure.
    pub fn internal_error() -> Self {
        Self {
            answer: FAILURE_ANSWER.into(),
            citations: Vec::new(),
            next_cursor: None,
            follow_up: FAILURE_FOLLOW_UP.into(),
        }
    }
}
