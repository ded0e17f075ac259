//! LLM backends behind one trait: Ollama and OpenAI-compatible servers.
//!
//! Both clients are non-streaming; the agent only needs the final reply text.

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// A single chat message (role + content).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_SYSTEM.to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_USER.to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ROLE_ASSISTANT.to_string(),
            content: content.into(),
        }
    }
}

/// Sampling options passed through to the backend when set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChatOptions {
    pub temperature: Option<f32>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("{backend} request failed: {source}")]
    Request {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{backend} api error: {status} {body}")]
    Api {
        backend: &'static str,
        status: u16,
        body: String,
    },
    #[error("{0} returned no assistant message")]
    EmptyResponse(&'static str),
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Short backend name for logs (e.g. "ollama").
    fn name(&self) -> &'static str;

    /// Model used when the configured model is empty.
    fn default_model(&self) -> &'static str;

    /// Send the conversation and return the assistant reply.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatMessage, LlmError>;
}

/// Build a reqwest client with an optional overall request timeout.
pub(crate) fn http_client(
    backend: &'static str,
    timeout: Option<std::time::Duration>,
) -> Result<reqwest::Client, LlmError> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = timeout {
        builder = builder.timeout(t);
    }
    builder
        .build()
        .map_err(|source| LlmError::Request { backend, source })
}

/// Turn a non-success response into `LlmError::Api`.
pub(crate) async fn check_status(
    backend: &'static str,
    res: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    Err(LlmError::Api {
        backend,
        status,
        body,
    })
}
