//! Agent factories and the registry that resolves `agentFactory=` references.

use super::llm_agent::LlmAgent;
use super::memory::ChatMemoryStore;
use super::{Agent, AgentError};
use crate::config::{Provider, ResolvedAgentSettings};
use crate::endpoint::BeanRef;
use crate::llm::{ChatOptions, LlmBackend, LlmError, OllamaClient, OpenAiClient};
use std::collections::HashMap;
use std::sync::Arc;

/// Name the default factory is registered under.
pub const DEFAULT_FACTORY_NAME: &str = "DefaultAgentFactory";

/// Builds the agent for an agent id. Called once per agent id when a context starts.
pub trait AgentFactory: Send + Sync {
    fn create_agent(
        &self,
        agent_id: &str,
        settings: &ResolvedAgentSettings,
    ) -> Result<Arc<dyn Agent>, AgentError>;
}

/// Builds an [`LlmAgent`] for the configured provider, with a memory window of
/// `memoryMaxMessages` messages per conversation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAgentFactory;

impl AgentFactory for DefaultAgentFactory {
    fn create_agent(
        &self,
        agent_id: &str,
        settings: &ResolvedAgentSettings,
    ) -> Result<Arc<dyn Agent>, AgentError> {
        let client_err = |e: LlmError| AgentError::Config {
            agent_id: agent_id.to_string(),
            reason: format!("building {} client: {}", settings.provider.as_str(), e),
        };
        let backend: Arc<dyn LlmBackend> = match settings.provider {
            Provider::Ollama => Arc::new(
                OllamaClient::new(settings.base_url.clone(), settings.timeout)
                    .map_err(client_err)?,
            ),
            Provider::Openai => {
                if settings.base_url.is_none() && settings.api_key.is_none() {
                    return Err(AgentError::Config {
                        agent_id: agent_id.to_string(),
                        reason: "openai provider needs apiKey (or OPENAI_API_KEY) or a baseUrl"
                            .to_string(),
                    });
                }
                Arc::new(
                    OpenAiClient::new(
                        settings.base_url.clone(),
                        settings.api_key.clone(),
                        settings.timeout,
                    )
                    .map_err(client_err)?,
                )
            }
        };
        log::info!(
            "agent {}: provider {}, model {}, memory window {}",
            agent_id,
            settings.provider.as_str(),
            if settings.model.is_empty() {
                backend.default_model()
            } else {
                settings.model.as_str()
            },
            settings.memory_max_messages
        );
        let agent = LlmAgent::new(backend, settings.model.clone())
            .with_system_message(settings.system_message.clone())
            .with_options(ChatOptions {
                temperature: settings.temperature,
            })
            .with_memory(ChatMemoryStore::new(settings.memory_max_messages));
        Ok(Arc::new(agent))
    }
}

/// Named agent factories. `#class:a.b.Name` and `#bean:Name` resolve by exact
/// name first, then by the simple name after the last `.`.
#[derive(Clone, Default)]
pub struct AgentFactoryRegistry {
    factories: HashMap<String, Arc<dyn AgentFactory>>,
}

impl AgentFactoryRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with [`DefaultAgentFactory`] registered.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register(DEFAULT_FACTORY_NAME, Arc::new(DefaultAgentFactory));
        r
    }

    /// Register (or replace) a factory.
    pub fn register(&mut self, name: impl Into<String>, factory: Arc<dyn AgentFactory>) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            log::debug!("agent factory {} replaced", name);
        }
    }

    pub fn resolve(&self, reference: &BeanRef) -> Result<Arc<dyn AgentFactory>, AgentError> {
        let name = reference.name();
        if let Some(f) = self.factories.get(name) {
            return Ok(f.clone());
        }
        let simple = name.rsplit('.').next().unwrap_or(name);
        self.factories
            .get(simple)
            .cloned()
            .ok_or_else(|| AgentError::UnknownFactory(name.to_string()))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_then_simple_name() {
        let registry = AgentFactoryRegistry::with_defaults();
        assert!(registry
            .resolve(&BeanRef::Class(DEFAULT_FACTORY_NAME.to_string()))
            .is_ok());
        assert!(registry
            .resolve(&BeanRef::Class(
                "org.example.agent.factory.DefaultAgentFactory".to_string()
            ))
            .is_ok());
        assert!(registry
            .resolve(&BeanRef::Bean(DEFAULT_FACTORY_NAME.to_string()))
            .is_ok());
        assert!(matches!(
            registry.resolve(&BeanRef::Class("com.example.Missing".to_string())),
            Err(AgentError::UnknownFactory(name)) if name == "com.example.Missing"
        ));
        assert_eq!(registry.names(), vec![DEFAULT_FACTORY_NAME.to_string()]);
    }

    #[test]
    fn default_factory_builds_ollama_agent_without_network() {
        let settings = ResolvedAgentSettings::default();
        assert!(DefaultAgentFactory
            .create_agent("test-memory-agent", &settings)
            .is_ok());
    }

    #[test]
    fn default_factory_applies_request_timeout() {
        let settings = ResolvedAgentSettings {
            provider: Provider::Openai,
            base_url: Some("http://127.0.0.1:1234/v1".to_string()),
            timeout: Some(std::time::Duration::from_secs(5)),
            ..ResolvedAgentSettings::default()
        };
        assert!(DefaultAgentFactory.create_agent("a", &settings).is_ok());
    }

    #[test]
    fn openai_without_key_or_url_is_rejected() {
        let settings = ResolvedAgentSettings {
            provider: Provider::Openai,
            base_url: None,
            api_key: None,
            ..ResolvedAgentSettings::default()
        };
        assert!(matches!(
            DefaultAgentFactory.create_agent("a", &settings),
            Err(AgentError::Config { .. })
        ));
    }
}
