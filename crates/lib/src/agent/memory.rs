//! Chat memory keyed by conversation (memory) id.
//!
//! Each conversation keeps a sliding window of its most recent messages; the
//! oldest message is evicted once the window is full.

use crate::llm::ChatMessage;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_MAX_MESSAGES: usize = 20;

/// In-memory message windows, shared by clones.
#[derive(Clone)]
pub struct ChatMemoryStore {
    inner: Arc<RwLock<HashMap<String, Vec<ChatMessage>>>>,
    max_messages: usize,
}

impl Default for ChatMemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

impl ChatMemoryStore {
    /// `max_messages` below 1 is treated as 1.
    pub fn new(max_messages: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            max_messages: max_messages.max(1),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Messages of a conversation, oldest first. Unknown ids yield an empty window.
    pub async fn messages(&self, memory_id: &str) -> Vec<ChatMessage> {
        self.inner
            .read()
            .await
            .get(memory_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Append a message, creating the conversation if needed and evicting the oldest overflow.
    pub async fn append(&self, memory_id: &str, message: ChatMessage) {
        let mut g = self.inner.write().await;
        self.push(&mut g, memory_id, message);
    }

    /// Append a message and return the resulting window under one lock, so the
    /// window always ends with `message`.
    pub async fn push_and_window(
        &self,
        memory_id: &str,
        message: ChatMessage,
    ) -> Vec<ChatMessage> {
        let mut g = self.inner.write().await;
        self.push(&mut g, memory_id, message).clone()
    }

    fn push<'a>(
        &self,
        conversations: &'a mut HashMap<String, Vec<ChatMessage>>,
        memory_id: &str,
        message: ChatMessage,
    ) -> &'a Vec<ChatMessage> {
        let window = conversations.entry(memory_id.to_string()).or_default();
        window.push(message);
        if window.len() > self.max_messages {
            let overflow = window.len() - self.max_messages;
            window.drain(..overflow);
            log::trace!("memory {}: evicted {} message(s)", memory_id, overflow);
        }
        window
    }

    /// Forget a conversation. Returns whether it existed.
    pub async fn clear(&self, memory_id: &str) -> bool {
        self.inner.write().await.remove(memory_id).is_some()
    }

    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
