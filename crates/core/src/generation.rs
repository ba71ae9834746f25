//! Generator trait: the abstraction over language-generation backends.
//!
//! A Generator takes a fully rendered prompt and returns the backend's raw
//! reply text. The reply is untrusted: it is expected, but not guaranteed, to
//! be the JSON answer shape requested by the prompt.

use async_trait::async_trait;
use tracing::warn;

use crate::error::GenerationError;

/// Returned when the backend could not be reached or timed out.
pub const APOLOGY_ERROR: &str =
    "I apologize, but I encountered an error while processing your request.";

/// Returned when the backend answered without a usable completion.
pub const APOLOGY_UNAVAILABLE: &str =
    "I apologize, but I'm unable to generate a response at the moment.";

impl GenerationError {
    /// The apology text that stands in for a reply when this error occurs.
    pub fn apology(&self) -> &'static str {
        match self {
            GenerationError::Network(_) | GenerationError::Timeout(_) => APOLOGY_ERROR,
            GenerationError::Status { .. } | GenerationError::MalformedEnvelope(_) => {
                APOLOGY_UNAVAILABLE
            }
        }
    }
}

/// The core Generator trait.
///
/// Implementations only provide [`Generator::complete`]; callers in the
/// assistant pipeline use [`Generator::generate`], which never fails.
#[async_trait]
pub trait Generator: Send + Sync {
    /// A human-readable name for this backend (e.g., "llama", "openai").
    fn name(&self) -> &str;

    /// Send the prompt and return the first completion's text.
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Send the prompt, degrading any failure to a fixed apology string.
    ///
    /// A backend outage and an empty completion are indistinguishable to the
    /// caller: both produce text that does not parse as an answer.
    async fn generate(&self, prompt: &str) -> String {
        match self.complete(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(backend = %self.name(), error = %e, "Generation failed, replying with apology");
                e.apology().to_string()
            }
        }
    }
}
