//! OpenAI-compatible chat-completions client.
//!
//! Works with llama.cpp server, vLLM, Ollama, OpenAI, and any backend that
//! exposes `POST /v1/chat/completions`.
//!
//! Every request carries two messages: the fixed [`SYSTEM_INSTRUCTION`] and
//! the rendered prompt as the user message. Sampling is deterministic by
//! default (temperature 0, 512 output tokens). One attempt per request, no
//! retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use teamkb_config::GenerationConfig;
use teamkb_core::error::GenerationError;
use teamkb_core::generation::Generator;
use teamkb_core::message::Message;
use tracing::{debug, warn};

/// The assistant persona and output contract, sent as the system message.
pub const SYSTEM_INSTRUCTION: &str = "You are 'TeamKB Assistant' — an internal knowledge assistant for a team. Follow these rules:
- Use ONLY the text inside 'RETRIEVED_DOCUMENTS'.
- Cite any factual claims with chunk id and cursor, e.g. [doc:42,cursor:abc123].
- If no answer is found, answer 'I don't know' and suggest next action.
- If user asks for 'more', set next_cursor to retriever_next_cursor.
- Respond ONLY as valid JSON:

{
  \"answer\": \"<assistant answer>\",
  \"citations\": [\"doc:42,cursor:abc123\"],
  \"next_cursor\": \"<cursor-or-null>\",
  \"follow_up\": \"<suggested follow-up>\"
}";

/// A chat-completions generation backend.
///
/// The `reqwest::Client` is injected so that the connection pool is shared
/// across requests and the client can be substituted in tests.
pub struct OpenAiCompatGenerator {
    name: String,
    base_url: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatGenerator {
    /// Create a generator over an existing HTTP client with default sampling.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let defaults = GenerationConfig::default();
        Self {
            name: "openai_compat".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout: Duration::from_secs(defaults.timeout_secs),
            client,
        }
    }

    /// Build a generator (and its pooled HTTP client) from configuration.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::new(client, &config.base_url, &config.model)
            .with_api_key(config.api_key.clone())
            .with_sampling(config.temperature, config.max_tokens)
            .with_timeout(timeout))
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Bound each backend call; a timeout degrades like any other failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::system(SYSTEM_INSTRUCTION), Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(format!("no reply within {:?}", self.timeout))
        } else {
            GenerationError::Network(e.to_string())
        }
    }

    /// Whether the backend answers `GET {base}/models` with a success status.
    pub async fn health_check(&self) -> Result<bool, GenerationError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url).timeout(self.timeout))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt);

        debug!(
            backend = %self.name,
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending completion request"
        );

        let response = self
            .authorize(self.client.post(&url).timeout(self.timeout))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %error_body, "Backend returned error");
            return Err(GenerationError::Status {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let envelope: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                GenerationError::MalformedEnvelope(format!("Failed to parse response: {e}"))
            }
        })?;

        let content = envelope
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                GenerationError::MalformedEnvelope("No choices[0].message.content in response".into())
            })?;

        if let Some(usage) = &envelope.usage {
            debug!(
                model = envelope.model.as_deref().unwrap_or(&self.model),
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Completion received"
            );
        }

        Ok(content)
    }
}

// --- Chat-completions API types (internal) ---

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    message: Option<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}
