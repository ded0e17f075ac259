//! OpenAI-compatible chat completions (OpenAI, LM Studio, vLLM, ...).

use super::{check_status, http_client, ChatMessage, ChatOptions, LlmBackend, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const BACKEND: &str = "openai";

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiClient {
    /// `base_url` includes the version segment (e.g. `http://127.0.0.1:1234/v1`).
    pub fn new(
        base_url: Option<String>,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: http_client(BACKEND, timeout)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    role: Option<String>,
    /// `null` when the model answered with tool calls only.
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    /// POST {base}/chat/completions, non-streaming.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatMessage, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model,
            messages,
            stream: false,
            temperature: options.temperature,
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await.map_err(|source| LlmError::Request {
            backend: BACKEND,
            source,
        })?;
        let res = check_status(BACKEND, res).await?;
        let data: CompletionResponse = res.json().await.map_err(|source| LlmError::Request {
            backend: BACKEND,
            source,
        })?;
        let message = data
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .ok_or(LlmError::EmptyResponse(BACKEND))?;
        let content = message.content.ok_or(LlmError::EmptyResponse(BACKEND))?;
        Ok(ChatMessage {
            role: message
                .role
                .unwrap_or_else(|| super::ROLE_ASSISTANT.to_string()),
            content,
        })
    }
}
