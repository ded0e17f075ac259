//! The built-in conversation demo: two one-shot timers talking to the same agent.
//!
//! `startup` tells the agent a name after 2s; `check` asks for it after 5s.
//! With memory both exchanges carry `memoryId=1`, so the second answer can
//! recall the first message. Stateless, the agent has no way to know.

use crate::exchange::headers;
use crate::expression::constant;
use crate::route::{RouteBuilder, RouteDefinitions};

pub const AGENT_ID: &str = "test-memory-agent";
pub const MEMORY_ID: &str = "1";

const AGENT_URI: &str = "agent:test-memory-agent?agentFactory=#class:DefaultAgentFactory";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationRoutes {
    with_memory: bool,
}

impl ConversationRoutes {
    pub fn with_memory() -> Self {
        Self { with_memory: true }
    }

    pub fn stateless() -> Self {
        Self { with_memory: false }
    }
}

impl RouteBuilder for ConversationRoutes {
    fn configure(&self, routes: &mut RouteDefinitions) {
        let turns = [
            ("startup", "timer:startup?delay=2000&repeatCount=1", "My name is Alice"),
            ("check", "timer:check?delay=5000&repeatCount=1", "What is my name?"),
        ];
        for (id, from, body) in turns {
            let route = routes.from(from);
            route.route_id(id).set_body(constant(body));
            if self.with_memory {
                route.set_header(headers::MEMORY_ID, constant(MEMORY_ID));
            }
            route.to(AGENT_URI).log("${body}");
        }
    }
}
