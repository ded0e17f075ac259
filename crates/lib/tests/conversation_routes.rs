//! Integration test: the built-in conversation routes against a recording agent.
//! Runs on a paused clock, so the 2s/5s timers complete instantly.

use async_trait::async_trait;
use conduit::agent::{Agent, AgentError, AgentFactory, AgentFactoryRegistry, AgentRequest};
use conduit::config::{Config, ResolvedAgentSettings};
use conduit::context::RouteContext;
use conduit::demo::ConversationRoutes;
use conduit::log_sink::MemoryLogSink;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Remembers what it was told per memory id and records every call.
struct RecordingAgent {
    start: Instant,
    calls: Mutex<Vec<(Duration, AgentRequest)>>,
    told: Mutex<HashMap<String, Vec<String>>>,
}

impl RecordingAgent {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            calls: Mutex::new(Vec::new()),
            told: Mutex::new(HashMap::new()),
        }
    }

    fn calls(&self) -> Vec<(Duration, AgentRequest)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for RecordingAgent {
    async fn chat(&self, request: AgentRequest) -> Result<String, AgentError> {
        self.calls
            .lock()
            .unwrap()
            .push((self.start.elapsed(), request.clone()));
        let history = match &request.memory_id {
            Some(id) => {
                let mut told = self.told.lock().unwrap();
                let entry = told.entry(id.clone()).or_default();
                entry.push(request.user_message.clone());
                entry.clone()
            }
            None => vec![request.user_message.clone()],
        };
        if request.user_message == "What is my name?" {
            if history.iter().any(|m| m == "My name is Alice") {
                return Ok("Your name is Alice.".to_string());
            }
            return Ok("I don't know your name.".to_string());
        }
        Ok(format!("Nice to meet you! ({})", request.user_message))
    }
}

struct RecordingFactory {
    agent: Arc<RecordingAgent>,
    created: AtomicUsize,
}

impl AgentFactory for RecordingFactory {
    fn create_agent(
        &self,
        agent_id: &str,
        _settings: &ResolvedAgentSettings,
    ) -> Result<Arc<dyn Agent>, AgentError> {
        assert_eq!(agent_id, "test-memory-agent");
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.agent.clone())
    }
}

async fn run_conversation(
    routes: ConversationRoutes,
) -> (Arc<RecordingAgent>, Arc<RecordingFactory>, Arc<MemoryLogSink>) {
    let agent = Arc::new(RecordingAgent::new());
    let factory = Arc::new(RecordingFactory {
        agent: agent.clone(),
        created: AtomicUsize::new(0),
    });
    let mut registry = AgentFactoryRegistry::new();
    registry.register("DefaultAgentFactory", factory.clone());
    let sink = Arc::new(MemoryLogSink::new());

    let mut context = RouteContext::new(Config::default())
        .with_agent_factories(registry)
        .with_log_sink(sink.clone());
    context.add_routes(&routes).unwrap();
    assert_eq!(context.route_ids(), vec!["startup", "check"]);
    context.start().unwrap();
    context.await_completion().await;

    for id in ["startup", "check"] {
        let stats = context.route_stats(id).unwrap();
        assert_eq!((stats.completed, stats.failed), (1, 0), "route {}", id);
        assert!(stats.consumer_done);
    }
    (agent, factory, sink)
}

#[tokio::test(start_paused = true)]
async fn memory_routes_share_conversation_one() {
    let (agent, factory, sink) = run_conversation(ConversationRoutes::with_memory()).await;

    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    let calls = agent.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, Duration::from_millis(2000));
    assert_eq!(calls[0].1.user_message, "My name is Alice");
    assert_eq!(calls[0].1.memory_id.as_deref(), Some("1"));
    assert_eq!(calls[1].0, Duration::from_millis(5000));
    assert_eq!(calls[1].1.user_message, "What is my name?");
    assert_eq!(calls[1].1.memory_id.as_deref(), Some("1"));

    assert_eq!(
        sink.messages_for("startup"),
        vec!["Nice to meet you! (My name is Alice)"]
    );
    assert_eq!(sink.messages_for("check"), vec!["Your name is Alice."]);
}

#[tokio::test(start_paused = true)]
async fn stateless_routes_send_no_memory_id() {
    let (agent, _, sink) = run_conversation(ConversationRoutes::stateless()).await;

    let calls = agent.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|(_, r)| r.memory_id.is_none()));
    assert_eq!(sink.messages_for("check"), vec!["I don't know your name."]);
}
