//! Producer endpoints: the targets of `to(...)` steps.

use crate::agent::AgentError;
use crate::endpoint::{EndpointError, EndpointUri};
use crate::exchange::Exchange;
use crate::expression::ExpressionError;
use crate::log_sink::{LogLine, LogSink};
use async_trait::async_trait;
use std::sync::Arc;

/// Failure while processing one exchange.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("agent {agent_id} failed: {source}")]
    Agent {
        agent_id: String,
        #[source]
        source: AgentError,
    },
    #[error(transparent)]
    Expression(#[from] ExpressionError),
}

#[async_trait]
pub trait Producer: Send + Sync {
    fn uri(&self) -> &str;

    async fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessError>;
}

/// `log:<name>?level=<level>&showHeaders=<bool>`: logs the exchange and leaves it unchanged.
pub struct LogProducer {
    uri: String,
    name: String,
    level: log::Level,
    show_headers: bool,
    sink: Arc<dyn LogSink>,
}

impl LogProducer {
    pub fn from_uri(mut uri: EndpointUri, sink: Arc<dyn LogSink>) -> Result<Self, EndpointError> {
        let level = match uri.take_str("level") {
            None => log::Level::Info,
            Some(l) => l.parse::<log::Level>().map_err(|_| EndpointError::InvalidOption {
                key: "level".to_string(),
                value: l.clone(),
                uri: uri.as_str().to_string(),
            })?,
        };
        let show_headers = uri.take_bool("showHeaders")?.unwrap_or(false);
        uri.ensure_consumed()?;
        Ok(Self {
            uri: uri.as_str().to_string(),
            name: uri.path().to_string(),
            level,
            show_headers,
            sink,
        })
    }

    fn render(&self, exchange: &Exchange) -> String {
        if self.show_headers {
            let headers: Vec<String> = exchange
                .message
                .headers
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            format!(
                "Exchange[Headers: {{{}}}, Body: {}]",
                headers.join(", "),
                exchange.message.body
            )
        } else {
            format!("Exchange[Body: {}]", exchange.message.body)
        }
    }
}

#[async_trait]
impl Producer for LogProducer {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessError> {
        self.sink.write(LogLine {
            level: self.level,
            route_id: exchange.route_id().to_string(),
            logger: self.name.clone(),
            message: self.render(exchange),
        });
        Ok(())
    }
}
