//! `mock:<name>`: records every exchange it receives. Used to assert on routes.

use crate::exchange::{Exchange, Message};
use crate::producer::{ProcessError, Producer};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
pub struct MockEndpoint {
    name: String,
    uri: String,
    received: Mutex<Vec<Exchange>>,
    notify: Notify,
}

impl MockEndpoint {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uri: format!("mock:{}", name),
            name,
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn received_count(&self) -> usize {
        self.received.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn received_messages(&self) -> Vec<Message> {
        self.received
            .lock()
            .map(|g| g.iter().map(|e| e.message.clone()).collect())
            .unwrap_or_default()
    }

    pub fn received_bodies(&self) -> Vec<String> {
        self.received_messages()
            .into_iter()
            .map(|m| m.body)
            .collect()
    }

    /// Wait until at least `count` exchanges arrived. Returns false on timeout.
    pub async fn await_count(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.received_count() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

#[async_trait]
impl Producer for MockEndpoint {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessError> {
        if let Ok(mut g) = self.received.lock() {
            g.push(exchange.clone());
        }
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Mock endpoints by name, shared between a context and its tests.
#[derive(Clone, Default)]
pub struct MockRegistry {
    inner: Arc<Mutex<HashMap<String, Arc<MockEndpoint>>>>,
}

impl MockRegistry {
    pub fn get_or_create(&self, name: &str) -> Arc<MockEndpoint> {
        let mut g = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        g.entry(name.to_string())
            .or_insert_with(|| Arc::new(MockEndpoint::new(name)))
            .clone()
    }
}
