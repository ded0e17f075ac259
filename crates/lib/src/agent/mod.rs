//! Conversational agents: an LLM plus optional per-conversation memory.
//!
//! Agents are built by an [`AgentFactory`] named in the endpoint URI
//! (`agent:<id>?agentFactory=#class:DefaultAgentFactory`) and invoked by the
//! [`AgentProducer`] with the exchange body as the user message.

mod endpoint;
mod factory;
mod llm_agent;
mod memory;

pub use endpoint::{AgentEndpointSpec, AgentProducer, AGENT_SCHEMES};
pub use factory::{AgentFactory, AgentFactoryRegistry, DefaultAgentFactory, DEFAULT_FACTORY_NAME};
pub use llm_agent::LlmAgent;
pub use memory::{ChatMemoryStore, DEFAULT_MAX_MESSAGES};

use crate::llm::LlmError;
use async_trait::async_trait;

/// One call into an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRequest {
    pub user_message: String,
    /// Conversation id; `None` means a stateless call.
    pub memory_id: Option<String>,
    /// Overrides the agent's configured system prompt for this call.
    pub system_message: Option<String>,
}

impl AgentRequest {
    pub fn new(user_message: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ..Default::default()
        }
    }

    pub fn with_memory_id(mut self, id: impl Into<String>) -> Self {
        self.memory_id = Some(id.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("no agent factory registered as {0:?}")]
    UnknownFactory(String),
    #[error("agent {agent_id}: {reason}")]
    Config { agent_id: String, reason: String },
}

#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer one user message; returns the reply text.
    async fn chat(&self, request: AgentRequest) -> Result<String, AgentError>;
}
