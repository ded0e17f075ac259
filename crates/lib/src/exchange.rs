//! Message and exchange: the unit of work that flows through a route.
//!
//! An exchange is created when a trigger fires, mutated by each step, and
//! dropped after the last step. Nothing here outlives one route execution.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Well-known header names.
pub mod headers {
    /// Conversation correlation id read by the agent endpoint.
    pub const MEMORY_ID: &str = "memoryId";
    /// Per-call system prompt override read by the agent endpoint.
    pub const SYSTEM_MESSAGE: &str = "systemMessage";
    /// Name of the timer that created the exchange.
    pub const TIMER_NAME: &str = "timerName";
    /// 1-based firing counter of the timer.
    pub const TIMER_COUNTER: &str = "timerCounter";
    /// RFC 3339 timestamp of the firing.
    pub const FIRED_TIME: &str = "firedTime";
}

/// Body plus headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub body: String,
    pub headers: BTreeMap<String, String>,
}

impl Message {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(name)
    }
}

/// One route execution: identity, origin, and the message being processed.
#[derive(Debug, Clone)]
pub struct Exchange {
    id: String,
    route_id: String,
    created: DateTime<Utc>,
    pub message: Message,
}

impl Exchange {
    /// New exchange with an empty body for the given route.
    pub fn new(route_id: impl Into<String>) -> Self {
        let route_id = route_id.into();
        Self {
            id: format!("{}-{}", route_id, uuid::Uuid::new_v4()),
            route_id,
            created: Utc::now(),
            message: Message::default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }
}
