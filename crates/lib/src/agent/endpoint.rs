//! The `agent:<agent-id>?agentFactory=<ref>` producer endpoint.

use super::factory::DEFAULT_FACTORY_NAME;
use super::{Agent, AgentRequest};
use crate::endpoint::{BeanRef, EndpointError, EndpointUri};
use crate::exchange::{headers, Exchange};
use crate::producer::{ProcessError, Producer};
use async_trait::async_trait;
use std::sync::Arc;

/// URI schemes that address an agent.
pub const AGENT_SCHEMES: &[&str] = &["agent", "langchain4j-agent"];

/// Parsed agent endpoint options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEndpointSpec {
    pub agent_id: String,
    /// Defaults to `#class:DefaultAgentFactory` when the URI has no `agentFactory`.
    pub factory: BeanRef,
}

impl AgentEndpointSpec {
    pub fn from_uri(mut uri: EndpointUri) -> Result<Self, EndpointError> {
        if !AGENT_SCHEMES.contains(&uri.scheme()) {
            return Err(EndpointError::WrongRole {
                scheme: uri.scheme().to_string(),
                role: "agent endpoint",
                uri: uri.as_str().to_string(),
            });
        }
        let factory = match uri.take_str("agentFactory") {
            Some(r) => BeanRef::parse(&r)?,
            None => BeanRef::Class(DEFAULT_FACTORY_NAME.to_string()),
        };
        uri.ensure_consumed()?;
        Ok(Self {
            agent_id: uri.path().to_string(),
            factory,
        })
    }
}

/// Sends the body to the agent (with `memoryId` / `systemMessage` headers when
/// present) and replaces the body with the reply.
pub struct AgentProducer {
    uri: String,
    agent_id: String,
    agent: Arc<dyn Agent>,
}

impl AgentProducer {
    pub fn new(uri: impl Into<String>, agent_id: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        Self {
            uri: uri.into(),
            agent_id: agent_id.into(),
            agent,
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }
}

#[async_trait]
impl Producer for AgentProducer {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessError> {
        let request = AgentRequest {
            user_message: exchange.message.body.clone(),
            memory_id: exchange.message.header(headers::MEMORY_ID).map(str::to_string),
            system_message: exchange
                .message
                .header(headers::SYSTEM_MESSAGE)
                .map(str::to_string),
        };
        log::debug!(
            "exchange {}: calling agent {} (memory {:?})",
            exchange.id(),
            self.agent_id,
            request.memory_id
        );
        let reply = self
            .agent
            .chat(request)
            .await
            .map_err(|source| ProcessError::Agent {
                agent_id: self.agent_id.clone(),
                source,
            })?;
        exchange.message.body = reply;
        Ok(())
    }
}
