//! Answer oracle seam and its Ollama-backed HTTP client.
//!
//! The agent loop only sees the `AnswerOracle` trait: a system prompt plus
//! the conversation so far in, raw reply text out. `ChatClient` implements
//! it over the Ollama `/api/chat` API and also backs the intent classifier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sq_protocol::{Role, Turn};

use crate::config::OracleConfig;
use crate::error::OracleError;

/// Anything that can take the next turn of the conversation.
#[async_trait]
pub trait AnswerOracle: Send + Sync {
    /// Reply text for the next assistant turn. Expected to be JSON.
    async fn respond(&self, system_prompt: &str, conversation: &[Turn])
    -> Result<String, OracleError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Ollama chat API request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    format: &'a str,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f64,
}

/// Ollama chat API response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for an Ollama chat endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    config: OracleConfig,
}

impl ChatClient {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| OracleError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// One non-streaming chat round trip; returns the assistant content.
    pub async fn chat(&self, system_prompt: &str, turns: &[Turn]) -> Result<String, OracleError> {
        let url = format!("{}/api/chat", self.config.host.trim_end_matches('/'));

        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(ChatMessage {
            role: Role::System,
            content: system_prompt,
        });
        messages.extend(turns.iter().map(|turn| ChatMessage {
            role: turn.role,
            content: &turn.content,
        }));

        let body = ChatRequest {
            model: &self.config.model,
            messages,
            format: "json",
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            tracing::warn!(error = %e, model = %self.config.model, "oracle request failed");
            OracleError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "oracle returned non-2xx");
            return Err(OracleError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse oracle response body");
            OracleError::from(e)
        })?;

        chat.message
            .map(|m| m.content)
            .ok_or_else(|| OracleError::Body("response has no message".into()))
    }
}

#[async_trait]
impl AnswerOracle for ChatClient {
    async fn respond(
        &self,
        system_prompt: &str,
        conversation: &[Turn],
    ) -> Result<String, OracleError> {
        self.chat(system_prompt, conversation).await
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Extract JSON from model output, stripping markdown code fences if present.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    // Try ```json ... ``` first
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    // Try ``` ... ```
    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            return after[..end].trim();
        }
    }

    trimmed
}
