//! Where `log` steps and `log:` endpoints write.
//!
//! The default sink forwards to the `log` crate; `MemoryLogSink` keeps lines
//! in memory so tests can assert on what a route logged.

use std::sync::Mutex;

pub const LOG_TARGET: &str = "conduit::route";

/// One logged line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: log::Level,
    pub route_id: String,
    /// Logger name: the route id for `log` steps, the endpoint path for `log:` endpoints.
    pub logger: String,
    pub message: String,
}

pub trait LogSink: Send + Sync {
    fn write(&self, line: LogLine);
}

/// Writes through the `log` facade as `[logger] message`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCrateSink;

impl LogSink for LogCrateSink {
    fn write(&self, line: LogLine) {
        log::log!(target: LOG_TARGET, line.level, "[{}] {}", line.logger, line.message);
    }
}

/// Records lines in memory.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<LogLine>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Messages logged by a route, in order.
    pub fn messages_for(&self, route_id: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|l| l.route_id == route_id)
            .map(|l| l.message)
            .collect()
    }
}

impl LogSink for MemoryLogSink {
    fn write(&self, line: LogLine) {
        if let Ok(mut g) = self.lines.lock() {
            g.push(line);
        }
    }
}
