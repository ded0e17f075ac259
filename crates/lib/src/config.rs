//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.conduit/config.json`) and environment.
//! Every field is optional; a missing file means defaults.

use crate::agent::DEFAULT_MAX_MESSAGES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Agent defaults and per-agent overrides.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Which routes to run.
    #[serde(default)]
    pub routes: RoutesConfig,

    /// Run loop settings.
    #[serde(default)]
    pub main: MainConfig,
}

/// LLM provider for an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server.
    #[default]
    Ollama,
    /// OpenAI or any OpenAI-compatible server (LM Studio, vLLM, ...).
    #[serde(alias = "lmstudio", alias = "openai-compatible")]
    Openai,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ollama => "ollama",
            Provider::Openai => "openai",
        }
    }
}

/// Settings for one agent. Unset fields fall back to `agents.defaults`, then to built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSettings {
    pub provider: Option<Provider>,
    /// Model id as the backend knows it (e.g. "llama3.2:latest", "gpt-4o-mini").
    pub model: Option<String>,
    /// Backend base URL. OpenAI-compatible URLs include the version segment (".../v1").
    pub base_url: Option<String>,
    /// API key for OpenAI-compatible providers. Overridden by OPENAI_API_KEY env.
    pub api_key: Option<String>,
    pub system_message: Option<String>,
    /// Messages kept per conversation (default 20).
    pub memory_max_messages: Option<usize>,
    pub temperature: Option<f32>,
    /// Per-request timeout; no timeout when unset.
    pub timeout_secs: Option<u64>,
}

impl AgentSettings {
    /// Field-by-field overlay: values set in `over` win.
    fn overlay(&self, over: &AgentSettings) -> AgentSettings {
        AgentSettings {
            provider: over.provider.or(self.provider),
            model: over.model.clone().or_else(|| self.model.clone()),
            base_url: over.base_url.clone().or_else(|| self.base_url.clone()),
            api_key: over.api_key.clone().or_else(|| self.api_key.clone()),
            system_message: over
                .system_message
                .clone()
                .or_else(|| self.system_message.clone()),
            memory_max_messages: over.memory_max_messages.or(self.memory_max_messages),
            temperature: over.temperature.or(self.temperature),
            timeout_secs: over.timeout_secs.or(self.timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsConfig {
    /// Applied to every agent.
    #[serde(default)]
    pub defaults: AgentSettings,
    /// Per agent id (the path of `agent:<id>` URIs).
    #[serde(default)]
    pub named: BTreeMap<String, AgentSettings>,
}

/// Fully resolved agent settings handed to agent factories.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAgentSettings {
    pub provider: Provider,
    /// May be empty; the agent then uses the backend's default model.
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub system_message: Option<String>,
    pub memory_max_messages: usize,
    pub temperature: Option<f32>,
    pub timeout: Option<Duration>,
}

impl Default for ResolvedAgentSettings {
    fn default() -> Self {
        resolve_settings(&AgentSettings::default(), |_| None)
    }
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_var(key: &str) -> Option<String> {
    trimmed(std::env::var(key).ok())
}

fn resolve_settings(
    merged: &AgentSettings,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedAgentSettings {
    let provider = merged.provider.unwrap_or_default();
    let (key_env, url_env) = match provider {
        Provider::Ollama => (None, "OLLAMA_BASE_URL"),
        Provider::Openai => (Some("OPENAI_API_KEY"), "OPENAI_BASE_URL"),
    };
    ResolvedAgentSettings {
        provider,
        model: trimmed(merged.model.clone()).unwrap_or_default(),
        base_url: env(url_env).or_else(|| trimmed(merged.base_url.clone())),
        api_key: key_env
            .and_then(&env)
            .or_else(|| trimmed(merged.api_key.clone())),
        system_message: trimmed(merged.system_message.clone()),
        memory_max_messages: merged.memory_max_messages.unwrap_or(DEFAULT_MAX_MESSAGES),
        temperature: merged.temperature,
        timeout: merged.timeout_secs.map(Duration::from_secs),
    }
}

/// Resolve settings for an agent id: named settings over defaults; env
/// (OPENAI_API_KEY, OPENAI_BASE_URL, OLLAMA_BASE_URL) over file values.
pub fn resolve_agent_settings(config: &Config, agent_id: &str) -> ResolvedAgentSettings {
    let merged = match config.agents.named.get(agent_id) {
        Some(named) => config.agents.defaults.overlay(named),
        None => config.agents.defaults.clone(),
    };
    resolve_settings(&merged, env_var)
}

/// Built-in route set to install.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinRoutes {
    /// Conversation routes that share memory id 1.
    #[default]
    Memory,
    /// Conversation routes without a memory id.
    Stateless,
    /// Only routes from files.
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutesConfig {
    #[serde(default)]
    pub builtin: BuiltinRoutes,
    /// Route files (YAML or JSON). Relative paths are resolved against the config file's parent.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainConfig {
    /// Stop after this many seconds even if triggers remain.
    #[serde(default)]
    pub duration_max_seconds: Option<u64>,
    /// Keep running after every finite trigger has finished (until Ctrl+C).
    #[serde(default)]
    pub keep_running: bool,
    /// How long `stop` waits for in-flight exchanges (default 45).
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

fn default_shutdown_timeout_secs() -> u64 {
    45
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            duration_max_seconds: None,
            keep_running: false,
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CONDUIT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".conduit").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, CONDUIT_CONFIG_PATH, or the default. Missing file => default config.
/// Returns the config and the path that was used (for resolving relative route files).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Route file paths with relative entries resolved against the config file's parent.
pub fn resolve_route_files(config: &Config, config_path: &Path) -> Vec<PathBuf> {
    let config_parent = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config
        .routes
        .files
        .iter()
        .filter(|f| !f.as_os_str().is_empty())
        .map(|f| {
            if f.is_absolute() {
                f.clone()
            } else {
                config_parent.join(f)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.routes.builtin, BuiltinRoutes::Memory);
        assert!(config.routes.files.is_empty());
        assert_eq!(config.main.shutdown_timeout_secs, 45);
        assert!(!config.main.keep_running);
    }

    #[test]
    fn parses_camel_case_agent_settings() {
        let config: Config = serde_json::from_str(
            r#"{
                "agents": {
                    "defaults": { "provider": "ollama", "model": "llama3.2:latest", "memoryMaxMessages": 10 },
                    "named": {
                        "test-memory-agent": { "provider": "lmstudio", "baseUrl": "http://127.0.0.1:1234/v1", "timeoutSecs": 30 }
                    }
                },
                "routes": { "builtin": "stateless", "files": ["routes.yaml"] },
                "main": { "durationMaxSeconds": 10 }
            }"#,
        )
        .unwrap();
        let named = &config.agents.named["test-memory-agent"];
        assert_eq!(named.provider, Some(Provider::Openai));
        assert_eq!(named.timeout_secs, Some(30));
        assert_eq!(config.routes.builtin, BuiltinRoutes::Stateless);
        assert_eq!(config.main.duration_max_seconds, Some(10));
    }

    #[test]
    fn named_settings_overlay_defaults() {
        let mut config = Config::default();
        config.agents.defaults.model = Some("llama3.2:latest".to_string());
        config.agents.defaults.memory_max_messages = Some(10);
        config.agents.defaults.system_message = Some("Be brief.".to_string());
        config.agents.named.insert(
            "a".to_string(),
            AgentSettings {
                model: Some("qwen3:8b".to_string()),
                ..Default::default()
            },
        );
        let merged = config.agents.defaults.overlay(&config.agents.named["a"]);
        let resolved = resolve_settings(&merged, |_| None);
        assert_eq!(resolved.provider, Provider::Ollama);
        assert_eq!(resolved.model, "qwen3:8b");
        assert_eq!(resolved.memory_max_messages, 10);
        assert_eq!(resolved.system_message.as_deref(), Some("Be brief."));
    }

    #[test]
    fn env_overrides_file_values_per_provider() {
        let settings = AgentSettings {
            provider: Some(Provider::Openai),
            api_key: Some("file-key".to_string()),
            ..Default::default()
        };
        let env = |k: &str| match k {
            "OPENAI_API_KEY" => Some("env-key".to_string()),
            "OLLAMA_BASE_URL" => Some("http://ollama:11434".to_string()),
            _ => None,
        };
        let resolved = resolve_settings(&settings, env);
        assert_eq!(resolved.api_key.as_deref(), Some("env-key"));
        assert_eq!(resolved.base_url, None);

        let ollama = resolve_settings(&AgentSettings::default(), env);
        assert_eq!(ollama.base_url.as_deref(), Some("http://ollama:11434"));
        assert_eq!(ollama.api_key, None);
        assert_eq!(ollama.memory_max_messages, DEFAULT_MAX_MESSAGES);
    }

    #[test]
    fn route_files_resolve_against_config_dir() {
        let mut config = Config::default();
        config.routes.files = vec![PathBuf::from("routes.yaml"), PathBuf::from("/etc/r.json")];
        let files = resolve_route_files(&config, Path::new("/home/user/.conduit/config.json"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/home/user/.conduit/routes.yaml"),
                PathBuf::from("/etc/r.json")
            ]
        );
    }

    #[test]
    fn load_config_missing_file_is_default() {
        let path = std::env::temp_dir()
            .join(format!("conduit-config-test-{}", uuid::Uuid::new_v4()))
            .join("config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.routes.builtin, BuiltinRoutes::Memory);
    }
}
