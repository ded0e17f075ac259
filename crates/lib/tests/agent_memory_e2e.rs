//! Integration test: routes from a YAML file, the default agent factory and an
//! Ollama-compatible HTTP server (wiremock) that only knows what it is sent.

use conduit::config::{AgentSettings, Config};
use conduit::context::RouteContext;
use conduit::dsl::parse_routes_yaml;
use conduit::log_sink::MemoryLogSink;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Answers "What is my name?" only if an earlier user message in the same request gave it.
fn recall_responder(request: &Request) -> ResponseTemplate {
    let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
    let users: Vec<String> = body["messages"]
        .as_array()
        .map(|msgs| {
            msgs.iter()
                .filter(|m| m["role"] == "user")
                .filter_map(|m| m["content"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    let reply = match users.last().map(String::as_str) {
        Some("What is my name?") if users.iter().any(|u| u == "My name is Alice") => {
            "Your name is Alice."
        }
        Some("What is my name?") => "I don't know your name.",
        _ => "Hello!",
    };
    ResponseTemplate::new(200).set_body_json(json!({
        "message": { "role": "assistant", "content": reply },
        "done": true
    }))
}

fn routes_yaml(with_memory: bool) -> String {
    let header = if with_memory {
        "      - setHeader:\n          name: memoryId\n          constant: \"1\"\n"
    } else {
        ""
    };
    let route = |id: &str, delay: u64, body: &str| {
        format!(
            "- route:\n    id: {id}\n    from: \"timer:{id}?delay={delay}&repeatCount=1\"\n    steps:\n      - setBody:\n          constant: \"{body}\"\n{header}      - to: \"langchain4j-agent:test-memory-agent?agentFactory=#class:dev.example.DefaultAgentFactory\"\n      - log: \"${{body}}\"\n"
        )
    };
    format!(
        "{}{}",
        route("startup", 20, "My name is Alice"),
        route("check", 300, "What is my name?")
    )
}

async fn run(with_memory: bool) -> (Arc<MemoryLogSink>, MockServer) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(recall_responder)
        .mount(&server)
        .await;

    let mut config = Config::default();
    config.agents.defaults = AgentSettings {
        base_url: Some(server.uri()),
        model: Some("test-model".to_string()),
        ..Default::default()
    };
    let sink = Arc::new(MemoryLogSink::new());
    let mut context = RouteContext::new(config).with_log_sink(sink.clone());
    context
        .add_route_definitions(parse_routes_yaml(&routes_yaml(with_memory)).unwrap())
        .unwrap();
    context.start().unwrap();
    context.await_completion().await;
    (sink, server)
}

#[tokio::test]
async fn shared_memory_lets_the_second_route_recall_the_name() {
    let (sink, server) = run(true).await;
    assert_eq!(sink.messages_for("startup"), vec!["Hello!"]);
    assert_eq!(sink.messages_for("check"), vec!["Your name is Alice."]);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["model"], "test-model");
    assert_eq!(second["messages"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn without_memory_the_agent_cannot_recall() {
    let (sink, server) = run(false).await;
    assert_eq!(sink.messages_for("check"), vec!["I don't know your name."]);
    let requests = server.received_requests().await.unwrap();
    let second: Value = serde_json::from_slice(&requests[1].body).unwrap();
    assert_eq!(second["messages"].as_array().unwrap().len(), 1);
}
