//! Timer trigger: `timer:<name>?delay=<ms>&period=<ms>&repeatCount=<n>&fixedRate=<bool>`.
//!
//! Fires first after `delay`, then every `period` until `repeatCount` firings
//! (0 = unlimited) or until cancelled. Without `fixedRate`, the period is
//! measured from the end of the previous firing's processing.

use crate::endpoint::{EndpointError, EndpointUri};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const DEFAULT_DELAY_MS: u64 = 1000;
const DEFAULT_PERIOD_MS: u64 = 1000;

/// Parsed timer endpoint options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSpec {
    pub name: String,
    pub delay: Duration,
    pub period: Duration,
    /// 0 means fire until cancelled.
    pub repeat_count: u64,
    pub fixed_rate: bool,
}

impl TimerSpec {
    pub fn from_uri(mut uri: EndpointUri) -> Result<Self, EndpointError> {
        if uri.scheme() != "timer" {
            return Err(EndpointError::WrongRole {
                scheme: uri.scheme().to_string(),
                role: "timer",
                uri: uri.as_str().to_string(),
            });
        }
        let delay = uri
            .take_i64("delay")?
            .map(|ms| ms.max(0) as u64)
            .unwrap_or(DEFAULT_DELAY_MS);
        let period = uri.take_u64("period")?.unwrap_or(DEFAULT_PERIOD_MS);
        let repeat_count = uri.take_u64("repeatCount")?.unwrap_or(0);
        let fixed_rate = uri.take_bool("fixedRate")?.unwrap_or(false);
        uri.ensure_consumed()?;
        Ok(Self {
            name: uri.path().to_string(),
            delay: Duration::from_millis(delay),
            period: Duration::from_millis(period),
            repeat_count,
            fixed_rate,
        })
    }
}

/// Details of one firing, handed to the route.
#[derive(Debug, Clone)]
pub struct TimerFired {
    pub name: String,
    /// 1-based.
    pub counter: u64,
    pub fired_at: DateTime<Utc>,
}

pub struct TimerConsumer {
    spec: TimerSpec,
}

impl TimerConsumer {
    pub fn new(spec: TimerSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &TimerSpec {
        &self.spec
    }

    /// Drive the timer until it is exhausted or `shutdown` is cancelled.
    /// Returns the number of firings.
    pub async fn run<F, Fut>(&self, shutdown: &CancellationToken, mut fire: F) -> u64
    where
        F: FnMut(TimerFired) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut next = Instant::now() + self.spec.delay;
        let mut counter = 0u64;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    log::debug!("timer {}: cancelled after {} firing(s)", self.spec.name, counter);
                    return counter;
                }
                _ = tokio::time::sleep_until(next) => {}
            }
            let started = Instant::now();
            counter += 1;
            fire(TimerFired {
                name: self.spec.name.clone(),
                counter,
                fired_at: Utc::now(),
            })
            .await;

            if self.spec.repeat_count > 0 && counter >= self.spec.repeat_count {
                log::debug!("timer {}: repeat count {} reached", self.spec.name, counter);
                return counter;
            }
            next = if self.spec.fixed_rate {
                started + self.spec.period
            } else {
                Instant::now() + self.spec.period
            };
        }
    }
}
