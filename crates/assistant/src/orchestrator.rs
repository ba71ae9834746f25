//! Response orchestrator: the request pipeline and its validation state machine.
//!
//! ```text
//! Start → Retrieving → Prompting → Generating → Validating → Done
//!                                                          → FallbackDone
//!        (any unhandled fault, including a panic)          → Failed
//! ```
//!
//! Every state is entered at most once per request. The backend's reply is
//! untrusted input: it is parsed against the answer schema, its citations are
//! checked against the chunks that were actually shown, and its
//! `next_cursor` is always replaced by the retriever's.

use futures::FutureExt;
use serde::Deserialize;
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use teamkb_core::error::Result;
use teamkb_core::{AssistantRequest, AssistantResponse, Generator, RetrievalChunk};
use tracing::{debug, error, info, warn};

use crate::prompt::build_prompt;
use crate::retriever::Retriever;

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Retrieving,
    Prompting,
    Generating,
    Validating,
    /// The backend's reply was a valid answer.
    Done,
    /// The backend's reply could not be trusted; the fixed fallback was used.
    FallbackDone,
    /// The pipeline itself failed.
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::FallbackDone | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Retrieving => "retrieving",
            Self::Prompting => "prompting",
            Self::Generating => "generating",
            Self::Validating => "validating",
            Self::Done => "done",
            Self::FallbackDone => "fallback_done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A backend reply that matched the answer schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParsedAnswer {
    pub answer: String,
    pub citations: Vec<String>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    pub follow_up: String,
}

/// Result of checking a backend reply against the answer schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The reply is not JSON at all (including the apology strings).
    NotJson,
    /// The reply is JSON but not an answer object.
    WrongShape,
    Valid(ParsedAnswer),
}

/// Strictly parse a raw backend reply.
///
/// Surrounding whitespace is ignored, extra keys are ignored, and
/// `next_cursor` may be absent or null. Markdown fences are not stripped.
pub fn validate_reply(raw: &str) -> ValidationOutcome {
    let value: serde_json::Value = match serde_json::from_str(raw.trim()) {
        Ok(value) => value,
        Err(_) => return ValidationOutcome::NotJson,
    };
    match serde_json::from_value::<ParsedAnswer>(value) {
        Ok(parsed) => ValidationOutcome::Valid(parsed),
        Err(_) => ValidationOutcome::WrongShape,
    }
}

/// The chunk id a citation refers to, if it has the `doc:<id>,…` form.
///
/// Accepts the bracketed form used inside answers, e.g.
/// `[doc:42,cursor:cursor_page_1]`.
pub fn cited_chunk_id(citation: &str) -> Option<&str> {
    let inner = citation
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']');
    let rest = inner.strip_prefix("doc:")?;
    let id = rest.split(',').next()?.trim();
    (!id.is_empty()).then_some(id)
}

/// Keep only citations that refer to a chunk shown to the backend.
fn verified_citations(citations: Vec<String>, chunks: &[RetrievalChunk]) -> Vec<String> {
    let known: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    citations
        .into_iter()
        .filter(|citation| {
            let ok = cited_chunk_id(citation).is_some_and(|id| known.contains(id));
            if !ok {
                warn!(citation = %citation, "Dropping citation to a chunk that was not retrieved");
            }
            ok
        })
        .collect()
}

/// The response plus the terminal state it was produced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantOutcome {
    pub response: AssistantResponse,
    pub state: PipelineState,
}

impl AssistantOutcome {
    /// Whether the transport should report an internal error.
    pub fn is_internal_error(&self) -> bool {
        self.state == PipelineState::Failed
    }

    fn failed() -> Self {
        Self {
            response: AssistantResponse::internal_error(),
            state: PipelineState::Failed,
        }
    }
}

/// Drives one question through retrieve, prompt, generate, and validate.
pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
}

impl Orchestrator {
    pub fn new(retriever: Arc<dyn Retriever>, generator: Arc<dyn Generator>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    /// Answer an inbound request.
    pub async fn handle_request(&self, request: &AssistantRequest) -> AssistantOutcome {
        self.handle(
            &request.query,
            &request.conversation_history,
            request.cursor.as_deref(),
        )
        .await
    }

    /// Answer a question. Never fails and never panics out: any fault in the
    /// pipeline becomes the internal-error outcome.
    pub async fn handle(
        &self,
        query: &str,
        history: &[String],
        cursor: Option<&str>,
    ) -> AssistantOutcome {
        let run = AssertUnwindSafe(self.run(query, history, cursor))
            .catch_unwind()
            .await;

        let outcome = match run {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!(error = %e, "Assistant pipeline failed");
                AssistantOutcome::failed()
            }
            Err(panic) => {
                error!(panic = %panic_message(panic.as_ref()), "Assistant pipeline panicked");
                AssistantOutcome::failed()
            }
        };

        info!(
            state = %outcome.state,
            citations = outcome.response.citations.len(),
            next_cursor = ?outcome.response.next_cursor,
            "Assistant request finished"
        );
        outcome
    }

    async fn run(
        &self,
        query: &str,
        history: &[String],
        cursor: Option<&str>,
    ) -> Result<AssistantOutcome> {
        let state = advance(PipelineState::Start, PipelineState::Retrieving);
        let page = self.retriever.retrieve(query, cursor).await?;

        let state = advance(state, PipelineState::Prompting);
        let prompt = build_prompt(history, &page.chunks, query, page.next_cursor.as_deref());

        let state = advance(state, PipelineState::Generating);
        let raw = self.generator.generate(&prompt).await;

        let state = advance(state, PipelineState::Validating);
        let outcome = match validate_reply(&raw) {
            ValidationOutcome::Valid(parsed) => {
                if parsed.next_cursor != page.next_cursor {
                    debug!(
                        backend = ?parsed.next_cursor,
                        retriever = ?page.next_cursor,
                        "Replacing backend next_cursor"
                    );
                }
                AssistantOutcome {
                    response: AssistantResponse {
                        answer: parsed.answer,
                        citations: verified_citations(parsed.citations, &page.chunks),
                        next_cursor: page.next_cursor,
                        follow_up: parsed.follow_up,
                    },
                    state: advance(state, PipelineState::Done),
                }
            }
            invalid => {
                warn!(
                    branch = ?invalid,
                    reply_len = raw.len(),
                    "Backend reply is not a valid answer, using fallback"
                );
                AssistantOutcome {
                    response: AssistantResponse::fallback(page.next_cursor),
                    state: advance(state, PipelineState::FallbackDone),
                }
            }
        };

        Ok(outcome)
    }
}

fn advance(from: PipelineState, to: PipelineState) -> PipelineState {
    debug!(from = %from, to = %to, "Pipeline transition");
    to
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
