//! Route context: resolves route definitions into running consumers.
//!
//! `start` validates every route up front (URIs, options, expressions, agent
//! factories) and only then spawns one task per route. A failing exchange is
//! logged and counted; the route keeps consuming.

use crate::agent::{
    Agent, AgentEndpointSpec, AgentError, AgentFactory, AgentFactoryRegistry, AgentProducer,
    AGENT_SCHEMES,
};
use crate::config::{self, Config};
use crate::endpoint::{EndpointError, EndpointUri};
use crate::exchange::{headers, Exchange};
use crate::expression::{Expression, ExpressionError};
use crate::log_sink::{LogCrateSink, LogLine, LogSink};
use crate::mock::{MockEndpoint, MockRegistry};
use crate::producer::{LogProducer, ProcessError, Producer};
use crate::route::{RouteBuilder, RouteDefinition, RouteDefinitions, Step};
use crate::timer::{TimerConsumer, TimerFired, TimerSpec};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("route {route_id}: {source}")]
    Endpoint {
        route_id: String,
        #[source]
        source: EndpointError,
    },
    #[error("route {route_id}: {source}")]
    Expression {
        route_id: String,
        #[source]
        source: ExpressionError,
    },
    #[error("route {route_id}: {source}")]
    Agent {
        route_id: String,
        #[source]
        source: AgentError,
    },
    #[error("duplicate route id {0:?}")]
    DuplicateRouteId(String),
    #[error("agent {agent_id} is referenced with different factories ({first} and {second})")]
    ConflictingFactory {
        agent_id: String,
        first: String,
        second: String,
    },
    #[error("route context already started")]
    AlreadyStarted,
}

/// Per-route counters.
#[derive(Debug, Default)]
struct RouteStats {
    completed: AtomicU64,
    failed: AtomicU64,
    consumer_done: AtomicBool,
}

/// Point-in-time copy of a route's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStatsSnapshot {
    pub completed: u64,
    pub failed: u64,
    /// The trigger will not fire again (repeat count reached or stopped).
    pub consumer_done: bool,
}

enum Processor {
    SetBody(Expression),
    SetHeader(String, Expression),
    To(Arc<dyn Producer>),
    Log(Expression),
}

struct Pipeline {
    route_id: String,
    processors: Vec<Processor>,
    sink: Arc<dyn LogSink>,
}

impl Pipeline {
    async fn process(&self, exchange: &mut Exchange) -> Result<(), ProcessError> {
        for p in &self.processors {
            match p {
                Processor::SetBody(e) => exchange.message.body = e.evaluate(exchange)?,
                Processor::SetHeader(name, e) => {
                    let value = e.evaluate(exchange)?;
                    exchange.message.set_header(name.clone(), value);
                }
                Processor::To(producer) => {
                    log::trace!("exchange {}: to {}", exchange.id(), producer.uri());
                    producer.process(exchange).await?;
                }
                Processor::Log(e) => self.sink.write(LogLine {
                    level: log::Level::Info,
                    route_id: self.route_id.clone(),
                    logger: self.route_id.clone(),
                    message: e.evaluate(exchange)?,
                }),
            }
        }
        Ok(())
    }
}

/// An agent created at start, with the factory reference that first named it.
struct CachedAgent {
    factory_ref: String,
    factory: Arc<dyn AgentFactory>,
    agent: Arc<dyn Agent>,
}

struct PreparedRoute {
    consumer: TimerConsumer,
    pipeline: Arc<Pipeline>,
}

/// Owns route definitions, agent factories and the running route tasks.
pub struct RouteContext {
    config: Config,
    definitions: Vec<RouteDefinition>,
    factories: AgentFactoryRegistry,
    log_sink: Arc<dyn LogSink>,
    mocks: MockRegistry,
    agents: HashMap<String, CachedAgent>,
    /// Last `route<N>` number handed to an unnamed route.
    route_number: usize,
    stats: HashMap<String, Arc<RouteStats>>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    started: bool,
}

impl RouteContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            definitions: Vec::new(),
            factories: AgentFactoryRegistry::with_defaults(),
            log_sink: Arc::new(LogCrateSink),
            mocks: MockRegistry::default(),
            agents: HashMap::new(),
            route_number: 0,
            stats: HashMap::new(),
            shutdown: CancellationToken::new(),
            tracker: TaskTracker::new(),
            started: false,
        }
    }

    pub fn with_agent_factories(mut self, factories: AgentFactoryRegistry) -> Self {
        self.factories = factories;
        self
    }

    pub fn with_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = sink;
        self
    }

    /// Add every route a builder declares.
    pub fn add_routes(&mut self, builder: &dyn RouteBuilder) -> Result<(), RouteError> {
        let mut routes = RouteDefinitions::new();
        builder.configure(&mut routes);
        self.add_route_definitions(routes)
    }

    /// Add routes, e.g. from a route file. Unnamed routes get the next free
    /// `route<N>` id, numbered across the whole context. Ids must be unique;
    /// on error nothing is added.
    pub fn add_route_definitions(&mut self, routes: RouteDefinitions) -> Result<(), RouteError> {
        if self.started {
            return Err(RouteError::AlreadyStarted);
        }
        let mut ids: HashSet<String> = self.route_ids().into_iter().collect();
        let mut number = self.route_number;
        let mut added = Vec::with_capacity(routes.len());
        for mut r in routes.into_vec() {
            let id = match r.id() {
                Some(id) => id.to_string(),
                None => loop {
                    number += 1;
                    let candidate = format!("route{}", number);
                    if !ids.contains(&candidate) {
                        break candidate;
                    }
                },
            };
            if !ids.insert(id.clone()) {
                return Err(RouteError::DuplicateRouteId(id));
            }
            r.route_id(id);
            added.push(r);
        }
        self.route_number = number;
        self.definitions.extend(added);
        Ok(())
    }

    pub fn definitions(&self) -> &[RouteDefinition] {
        &self.definitions
    }

    pub fn route_ids(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|r| r.id().unwrap_or_default().to_string())
            .collect()
    }

    /// The `mock:<name>` endpoint shared with routes in this context.
    pub fn mock_endpoint(&self, name: &str) -> Arc<MockEndpoint> {
        self.mocks.get_or_create(name)
    }

    pub fn route_stats(&self, route_id: &str) -> Option<RouteStatsSnapshot> {
        self.stats.get(route_id).map(|s| RouteStatsSnapshot {
            completed: s.completed.load(Ordering::SeqCst),
            failed: s.failed.load(Ordering::SeqCst),
            consumer_done: s.consumer_done.load(Ordering::SeqCst),
        })
    }

    /// Validate all routes and spawn their consumers. Nothing is spawned if any route is invalid.
    pub fn start(&mut self) -> Result<(), RouteError> {
        if self.started {
            return Err(RouteError::AlreadyStarted);
        }
        let definitions = self.definitions.clone();
        let mut prepared = Vec::with_capacity(definitions.len());
        for def in &definitions {
            prepared.push(self.prepare(def)?);
        }

        for route in prepared {
            let route_id = route.pipeline.route_id.clone();
            let stats = Arc::new(RouteStats::default());
            self.stats.insert(route_id.clone(), stats.clone());
            let shutdown = self.shutdown.clone();
            let task = run_route(route.consumer, route.pipeline, stats, shutdown);
            self.tracker.spawn(task);
        }
        self.tracker.close();
        self.started = true;
        log::info!("started {} route(s)", self.definitions.len());
        Ok(())
    }

    fn prepare(&mut self, def: &RouteDefinition) -> Result<PreparedRoute, RouteError> {
        let route_id = def.id().unwrap_or_default().to_string();
        let endpoint_err = |source| RouteError::Endpoint {
            route_id: route_id.clone(),
            source,
        };

        let from = EndpointUri::parse(def.from_uri()).map_err(endpoint_err)?;
        let scheme = from.scheme().to_string();
        let spec = match scheme.as_str() {
            "timer" => TimerSpec::from_uri(from).map_err(endpoint_err)?,
            s if s == "log" || s == "mock" || AGENT_SCHEMES.contains(&s) => {
                return Err(endpoint_err(EndpointError::WrongRole {
                    scheme: s.to_string(),
                    role: "consumer",
                    uri: from.as_str().to_string(),
                }))
            }
            s => {
                return Err(endpoint_err(EndpointError::UnknownComponent {
                    scheme: s.to_string(),
                    uri: from.as_str().to_string(),
                }))
            }
        };

        let mut processors = Vec::with_capacity(def.steps().len());
        for step in def.steps() {
            let validate = |e: &Expression| {
                e.validate().map_err(|source| RouteError::Expression {
                    route_id: route_id.clone(),
                    source,
                })
            };
            processors.push(match step {
                Step::SetBody(e) => {
                    validate(e)?;
                    Processor::SetBody(e.clone())
                }
                Step::SetHeader { name, value } => {
                    validate(value)?;
                    Processor::SetHeader(name.clone(), value.clone())
                }
                Step::Log(e) => {
                    validate(e)?;
                    Processor::Log(e.clone())
                }
                Step::To(uri) => Processor::To(self.producer(&route_id, uri)?),
            });
        }

        Ok(PreparedRoute {
            consumer: TimerConsumer::new(spec),
            pipeline: Arc::new(Pipeline {
                route_id,
                processors,
                sink: self.log_sink.clone(),
            }),
        })
    }

    fn producer(&mut self, route_id: &str, uri: &str) -> Result<Arc<dyn Producer>, RouteError> {
        let endpoint_err = |source| RouteError::Endpoint {
            route_id: route_id.to_string(),
            source,
        };
        let parsed = EndpointUri::parse(uri).map_err(endpoint_err)?;
        let scheme = parsed.scheme().to_string();
        match scheme.as_str() {
            s if AGENT_SCHEMES.contains(&s) => {
                let raw = parsed.as_str().to_string();
                let spec = AgentEndpointSpec::from_uri(parsed).map_err(endpoint_err)?;
                let agent = self.agent_for(route_id, &spec)?;
                let producer: Arc<dyn Producer> =
                    Arc::new(AgentProducer::new(raw, spec.agent_id, agent));
                Ok(producer)
            }
            "log" => {
                let producer: Arc<dyn Producer> = Arc::new(
                    LogProducer::from_uri(parsed, self.log_sink.clone()).map_err(endpoint_err)?,
                );
                Ok(producer)
            }
            "mock" => {
                parsed.ensure_consumed().map_err(endpoint_err)?;
                let producer: Arc<dyn Producer> = self.mocks.get_or_create(parsed.path());
                Ok(producer)
            }
            "timer" => Err(endpoint_err(EndpointError::WrongRole {
                scheme: "timer".to_string(),
                role: "producer",
                uri: parsed.as_str().to_string(),
            })),
            s => Err(endpoint_err(EndpointError::UnknownComponent {
                scheme: s.to_string(),
                uri: parsed.as_str().to_string(),
            })),
        }
    }

    /// One agent per agent id, shared by every endpoint that names it.
    fn agent_for(
        &mut self,
        route_id: &str,
        spec: &AgentEndpointSpec,
    ) -> Result<Arc<dyn Agent>, RouteError> {
        let agent_err = |source| RouteError::Agent {
            route_id: route_id.to_string(),
            source,
        };
        let factory = self.factories.resolve(&spec.factory).map_err(agent_err)?;
        if let Some(cached) = self.agents.get(&spec.agent_id) {
            if !Arc::ptr_eq(&cached.factory, &factory) {
                return Err(RouteError::ConflictingFactory {
                    agent_id: spec.agent_id.clone(),
                    first: cached.factory_ref.clone(),
                    second: spec.factory.name().to_string(),
                });
            }
            return Ok(cached.agent.clone());
        }
        let settings = config::resolve_agent_settings(&self.config, &spec.agent_id);
        let agent = factory
            .create_agent(&spec.agent_id, &settings)
            .map_err(agent_err)?;
        self.agents.insert(
            spec.agent_id.clone(),
            CachedAgent {
                factory_ref: spec.factory.name().to_string(),
                factory,
                agent: agent.clone(),
            },
        );
        Ok(agent)
    }

    /// Wait until every route's trigger is exhausted and its last exchange finished.
    pub async fn await_completion(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    /// Stop all triggers and wait (bounded by `main.shutdownTimeoutSecs`) for in-flight exchanges.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        self.tracker.close();
        let timeout = Duration::from_secs(self.config.main.shutdown_timeout_secs);
        if tokio::time::timeout(timeout, self.tracker.wait()).await.is_err() {
            log::warn!(
                "{} route task(s) still running after {}s shutdown timeout",
                self.tracker.len(),
                timeout.as_secs()
            );
        } else {
            log::info!("all routes stopped");
        }
    }

    /// Start, then run until all triggers are exhausted (unless `main.keepRunning`),
    /// `main.durationMaxSeconds` elapses, or a shutdown signal arrives. Always stops before returning.
    pub async fn run(&mut self) -> Result<(), RouteError> {
        self.start()?;
        let main = self.config.main.clone();
        let tracker = self.tracker.clone();
        let max_duration = async {
            match main.duration_max_seconds {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        let completed = async {
            if main.keep_running {
                std::future::pending::<()>().await
            } else {
                tracker.wait().await
            }
        };
        tokio::select! {
            _ = completed => log::info!("all routes completed"),
            _ = max_duration => log::info!("max duration reached, stopping"),
            _ = shutdown_signal() => {}
        }
        self.stop().await;
        Ok(())
    }
}

async fn run_route(
    consumer: TimerConsumer,
    pipeline: Arc<Pipeline>,
    stats: Arc<RouteStats>,
    shutdown: CancellationToken,
) {
    let route_id = pipeline.route_id.clone();
    log::info!("route {} started (timer {})", route_id, consumer.spec().name);
    let fired = consumer
        .run(&shutdown, |fired| {
            let pipeline = pipeline.clone();
            let stats = stats.clone();
            async move { process_firing(&pipeline, &stats, fired).await }
        })
        .await;
    stats.consumer_done.store(true, Ordering::SeqCst);
    log::info!("route {} finished after {} exchange(s)", route_id, fired);
}

async fn process_firing(pipeline: &Pipeline, stats: &RouteStats, fired: TimerFired) {
    let mut exchange = Exchange::new(pipeline.route_id.clone());
    exchange.message.set_header(headers::TIMER_NAME, fired.name);
    exchange
        .message
        .set_header(headers::TIMER_COUNTER, fired.counter.to_string());
    exchange
        .message
        .set_header(headers::FIRED_TIME, fired.fired_at.to_rfc3339());

    match pipeline.process(&mut exchange).await {
        Ok(()) => {
            stats.completed.fetch_add(1, Ordering::SeqCst);
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::SeqCst);
            log::error!(
                "route {}: failed delivery for exchange {} (attempt 1, no redelivery): {}",
                pipeline.route_id,
                exchange.id(),
                e
            );
        }
    }
}

/// Completes on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, stopping routes");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRequest;
    use crate::config::ResolvedAgentSettings;
    use crate::dsl::parse_routes_yaml;
    use crate::expression::constant;
    use crate::log_sink::MemoryLogSink;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::Instant;

    struct EchoAgent;

    #[async_trait]
    impl Agent for EchoAgent {
        async fn chat(&self, request: AgentRequest) -> Result<String, AgentError> {
            Ok(request.user_message)
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl AgentFactory for CountingFactory {
        fn create_agent(
            &self,
            _agent_id: &str,
            _settings: &ResolvedAgentSettings,
        ) -> Result<Arc<dyn Agent>, AgentError> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(EchoAgent))
        }
    }

    fn context() -> (RouteContext, Arc<MemoryLogSink>) {
        let sink = Arc::new(MemoryLogSink::new());
        let ctx = RouteContext::new(Config::default()).with_log_sink(sink.clone());
        (ctx, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn runs_set_body_header_log_and_mock() {
        let (mut ctx, sink) = context();
        ctx.add_routes(&|routes: &mut RouteDefinitions| {
            routes
                .from("timer:t?delay=10&repeatCount=2")
                .route_id("r")
                .set_body(constant("hello"))
                .set_header("memoryId", constant("1"))
                .log("${body} #${header.timerCounter}")
                .to("mock:out");
        })
        .unwrap();
        let mock = ctx.mock_endpoint("out");
        ctx.start().unwrap();
        ctx.await_completion().await;

        assert_eq!(sink.messages_for("r"), vec!["hello #1", "hello #2"]);
        let messages = mock.received_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].header("memoryId"), Some("1"));
        assert_eq!(messages[1].header(headers::TIMER_NAME), Some("t"));
        assert_eq!(
            ctx.route_stats("r"),
            Some(RouteStatsSnapshot {
                completed: 2,
                failed: 0,
                consumer_done: true
            })
        );
    }

    #[test]
    fn duplicate_route_ids_are_rejected() {
        let (mut ctx, _) = context();
        let mut routes = RouteDefinitions::new();
        routes.from("timer:a").route_id("x");
        routes.from("timer:b").route_id("x");
        assert!(matches!(
            ctx.add_route_definitions(routes),
            Err(RouteError::DuplicateRouteId(id)) if id == "x"
        ));
    }

    #[test]
    fn unnamed_routes_are_numbered_across_the_context() {
        let (mut ctx, _) = context();
        let mut first = RouteDefinitions::new();
        first.from("timer:a");
        first.from("timer:b").route_id("route2");
        ctx.add_route_definitions(first).unwrap();
        let mut second = RouteDefinitions::new();
        second.from("timer:c");
        second.from("timer:d");
        ctx.add_route_definitions(second).unwrap();

        let yaml = "- route:\n    from: \"timer:e?repeatCount=1\"\n";
        ctx.add_route_definitions(parse_routes_yaml(yaml).unwrap())
            .unwrap();
        ctx.add_route_definitions(parse_routes_yaml(yaml).unwrap())
            .unwrap();
        assert_eq!(
            ctx.route_ids(),
            vec!["route1", "route2", "route3", "route4", "route5", "route6"]
        );
    }

    #[tokio::test]
    async fn invalid_routes_fail_start_without_spawning() {
        let cases: Vec<(&str, &str)> = vec![
            ("cron:x", "log:a"),
            ("log:x", "log:a"),
            ("timer:x?delay=1", "ftp:host"),
            ("timer:x?delay=1", "timer:y"),
            ("timer:x?delay=1", "agent:a?agentFactory=#class:com.example.Nope"),
            ("timer:x?delay=1&bogus=true", "log:a"),
        ];
        for (from, to) in cases {
            let (mut ctx, _) = context();
            let mut routes = RouteDefinitions::new();
            routes.from(from).route_id("bad").to(to);
            ctx.add_route_definitions(routes).unwrap();
            assert!(ctx.start().is_err(), "{} -> {} should not start", from, to);
            assert!(ctx.route_stats("bad").is_none());
        }

        let (mut ctx, _) = context();
        let mut routes = RouteDefinitions::new();
        routes.from("timer:x").log("${nope}");
        ctx.add_route_definitions(routes).unwrap();
        assert!(matches!(ctx.start(), Err(RouteError::Expression { .. })));
    }

    #[tokio::test]
    async fn references_to_the_same_factory_share_one_agent() {
        let factory = Arc::new(CountingFactory::default());
        let mut registry = AgentFactoryRegistry::new();
        registry.register("DefaultAgentFactory", factory.clone());
        let (ctx, _) = context();
        let mut ctx = ctx.with_agent_factories(registry);
        let mut routes = RouteDefinitions::new();
        routes.from("timer:a?repeatCount=1").to(
            "langchain4j-agent:x?agentFactory=#class:org.apache.camel.forage.agent.factory.DefaultAgentFactory",
        );
        routes.from("timer:b?repeatCount=1").to("agent:x");
        routes
            .from("timer:c?repeatCount=1")
            .to("agent:x?agentFactory=#bean:DefaultAgentFactory");
        ctx.add_route_definitions(routes).unwrap();
        ctx.start().unwrap();
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        ctx.stop().await;
    }

    #[tokio::test]
    async fn same_agent_with_two_factories_conflicts() {
        let mut registry = AgentFactoryRegistry::with_defaults();
        registry.register("Other", Arc::new(CountingFactory::default()));
        let (ctx, _) = context();
        let mut ctx = ctx.with_agent_factories(registry);
        let mut routes = RouteDefinitions::new();
        routes
            .from("timer:a")
            .to("agent:x?agentFactory=#class:DefaultAgentFactory");
        routes.from("timer:b").to("agent:x?agentFactory=#bean:Other");
        ctx.add_route_definitions(routes).unwrap();
        assert!(matches!(
            ctx.start(),
            Err(RouteError::ConflictingFactory { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_unbounded_timers() {
        let (mut ctx, _) = context();
        let mut routes = RouteDefinitions::new();
        routes
            .from("timer:tick?delay=0&period=100")
            .route_id("tick")
            .to("mock:ticks");
        ctx.add_route_definitions(routes).unwrap();
        let mock = ctx.mock_endpoint("ticks");
        ctx.start().unwrap();
        assert!(mock.await_count(3, Duration::from_secs(1)).await);
        ctx.stop().await;
        let stats = ctx.route_stats("tick").unwrap();
        assert!(stats.consumer_done);
        assert_eq!(stats.completed as usize, mock.received_count());
        assert!(matches!(ctx.start(), Err(RouteError::AlreadyStarted)));
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_when_finite_timers_are_done() {
        let (mut ctx, _) = context();
        let mut routes = RouteDefinitions::new();
        routes
            .from("timer:a?delay=100&period=500&repeatCount=2")
            .route_id("a")
            .to("mock:done");
        routes
            .from("timer:b?delay=300&repeatCount=1")
            .route_id("b")
            .to("mock:done");
        ctx.add_route_definitions(routes).unwrap();
        let started = Instant::now();
        ctx.run().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_millis(600));
        assert_eq!(ctx.route_stats("a").unwrap().completed, 2);
        assert_eq!(ctx.route_stats("b").unwrap().completed, 1);
        assert_eq!(ctx.mock_endpoint("done").received_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_unbounded_timers_after_max_duration() {
        let mut config = Config::default();
        config.main.duration_max_seconds = Some(1);
        let mut ctx = RouteContext::new(config);
        let mut routes = RouteDefinitions::new();
        routes
            .from("timer:tick?delay=0&period=100")
            .route_id("tick")
            .to("mock:ticks");
        ctx.add_route_definitions(routes).unwrap();
        let started = Instant::now();
        ctx.run().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(1));
        let stats = ctx.route_stats("tick").unwrap();
        assert!(stats.consumer_done);
        assert!(stats.completed >= 10, "completed {}", stats.completed);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_running_outlives_finite_timers() {
        let mut config = Config::default();
        config.main.keep_running = true;
        config.main.duration_max_seconds = Some(3);
        let mut ctx = RouteContext::new(config);
        let mut routes = RouteDefinitions::new();
        routes
            .from("timer:once?delay=100&repeatCount=1")
            .route_id("once")
            .to("mock:once");
        ctx.add_route_definitions(routes).unwrap();
        let started = Instant::now();
        ctx.run().await.unwrap();

        assert_eq!(started.elapsed(), Duration::from_secs(3));
        let stats = ctx.route_stats("once").unwrap();
        assert_eq!(stats.completed, 1);
        assert!(stats.consumer_done);
    }
}
