//! Agent turn: load the conversation window, call the LLM, remember the reply.

use super::memory::ChatMemoryStore;
use super::{Agent, AgentError, AgentRequest};
use crate::llm::{ChatMessage, ChatOptions, LlmBackend};
use async_trait::async_trait;
use std::sync::Arc;

/// An agent backed by an [`LlmBackend`], with memory for requests that carry a memory id.
pub struct LlmAgent {
    backend: Arc<dyn LlmBackend>,
    model: String,
    system_message: Option<String>,
    options: ChatOptions,
    memory: ChatMemoryStore,
}

impl LlmAgent {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            system_message: None,
            options: ChatOptions::default(),
            memory: ChatMemoryStore::default(),
        }
    }

    pub fn with_system_message(mut self, system_message: Option<String>) -> Self {
        self.system_message = system_message.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_memory(mut self, memory: ChatMemoryStore) -> Self {
        self.memory = memory;
        self
    }

    pub fn memory(&self) -> &ChatMemoryStore {
        &self.memory
    }

    fn model_name(&self) -> &str {
        let model = self.model.trim();
        if model.is_empty() {
            log::warn!(
                "agent: configured model was empty, using {} default {}",
                self.backend.name(),
                self.backend.default_model()
            );
            self.backend.default_model()
        } else {
            model
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    async fn chat(&self, request: AgentRequest) -> Result<String, AgentError> {
        let system = request
            .system_message
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.system_message.clone());
        let user = ChatMessage::user(request.user_message);

        let mut messages: Vec<ChatMessage> = Vec::new();
        if let Some(s) = system {
            messages.push(ChatMessage::system(s));
        }
        let memory_id = request
            .memory_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        match memory_id {
            Some(ref id) => messages.extend(self.memory.push_and_window(id, user).await),
            None => messages.push(user),
        }

        let model = self.model_name();
        log::debug!(
            "agent: {} call with model {} ({} message(s), memory {:?})",
            self.backend.name(),
            model,
            messages.len(),
            memory_id
        );
        let reply = self.backend.chat(model, &messages, &self.options).await?;

        if let Some(ref id) = memory_id {
            self.memory
                .append(id, ChatMessage::assistant(reply.content.clone()))
                .await;
        }
        Ok(reply.content)
    }
}
