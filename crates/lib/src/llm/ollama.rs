//! Ollama API client (http://127.0.0.1:11434 by default).

use super::{check_status, http_client, ChatMessage, ChatOptions, LlmBackend, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "llama3.2:latest";
const BACKEND: &str = "ollama";

#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self, LlmError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url,
            client: http_client(BACKEND, timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<RequestOptions>,
}

#[derive(Debug, Serialize)]
struct RequestOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

#[async_trait]
impl LlmBackend for OllamaClient {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    /// POST /api/chat with `stream: false`.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatMessage, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model,
            messages,
            stream: false,
            options: options
                .temperature
                .map(|temperature| RequestOptions { temperature }),
        };
        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| LlmError::Request {
                backend: BACKEND,
                source,
            })?;
        let res = check_status(BACKEND, res).await?;
        let data: ChatResponse = res.json().await.map_err(|source| LlmError::Request {
            backend: BACKEND,
            source,
        })?;
        data.message.ok_or(LlmError::EmptyResponse(BACKEND))
    }
}
