//! Route definitions: a trigger URI followed by an ordered list of steps.
//!
//! ```
//! use conduit::expression::constant;
//! use conduit::route::RouteDefinitions;
//!
//! let mut routes = RouteDefinitions::new();
//! routes
//!     .from("timer:startup?delay=2000&repeatCount=1")
//!     .set_body(constant("My name is Alice"))
//!     .to("agent:test-memory-agent?agentFactory=#class:DefaultAgentFactory")
//!     .log("${body}");
//! // Unnamed routes get `route<N>` ids when added to a context.
//! assert_eq!(routes.iter().next().unwrap().id(), None);
//! ```

use crate::expression::{simple, Expression};

/// One step of a route, executed in order for every exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SetBody(Expression),
    SetHeader { name: String, value: Expression },
    /// Send the exchange to a producer endpoint; the reply (if any) replaces the body.
    To(String),
    /// Write a simple-language template to the log sink.
    Log(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    id: Option<String>,
    from: String,
    steps: Vec<Step>,
}

impl RouteDefinition {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            id: None,
            from: from.into(),
            steps: Vec::new(),
        }
    }

    /// `None` until set explicitly or assigned by `RouteContext::add_route_definitions`.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn from_uri(&self) -> &str {
        &self.from
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn route_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = Some(id.into());
        self
    }

    pub fn set_body(&mut self, value: Expression) -> &mut Self {
        self.steps.push(Step::SetBody(value));
        self
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: Expression) -> &mut Self {
        self.steps.push(Step::SetHeader {
            name: name.into(),
            value,
        });
        self
    }

    pub fn to(&mut self, uri: impl Into<String>) -> &mut Self {
        self.steps.push(Step::To(uri.into()));
        self
    }

    /// Log a simple-language template, e.g. `"${body}"`.
    pub fn log(&mut self, template: impl Into<String>) -> &mut Self {
        self.steps.push(Step::Log(simple(template)));
        self
    }

    pub fn push_step(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// One-line summary, e.g. `startup: timer:startup -> setBody(constant("x")) -> log("${body}")`.
    /// Unnamed routes render without the id prefix.
    pub fn describe(&self) -> String {
        let mut out = match &self.id {
            Some(id) => format!("{}: {}", id, self.from),
            None => self.from.clone(),
        };
        for step in &self.steps {
            out.push_str(" -> ");
            match step {
                Step::SetBody(e) => out.push_str(&format!("setBody({})", e)),
                Step::SetHeader { name, value } => {
                    out.push_str(&format!("setHeader({}, {})", name, value))
                }
                Step::To(uri) => out.push_str(&format!("to({})", uri)),
                Step::Log(Expression::Simple(t)) | Step::Log(Expression::Constant(t)) => {
                    out.push_str(&format!("log({:?})", t))
                }
            }
        }
        out
    }
}

/// Ordered collection of route definitions, filled by `RouteBuilder`s and route files.
#[derive(Debug, Clone, Default)]
pub struct RouteDefinitions {
    routes: Vec<RouteDefinition>,
}

impl RouteDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new route from a trigger URI. Call `route_id` to name it.
    pub fn from(&mut self, uri: impl Into<String>) -> &mut RouteDefinition {
        self.routes.push(RouteDefinition::new(uri));
        let last = self.routes.len() - 1;
        &mut self.routes[last]
    }

    pub fn push(&mut self, route: RouteDefinition) {
        self.routes.push(route);
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_vec(self) -> Vec<RouteDefinition> {
        self.routes
    }
}

/// Declares routes. Implemented by applications; consumed by `RouteContext::add_routes`.
pub trait RouteBuilder {
    fn configure(&self, routes: &mut RouteDefinitions);
}

impl<F> RouteBuilder for F
where
    F: Fn(&mut RouteDefinitions),
{
    fn configure(&self, routes: &mut RouteDefinitions) {
        self(routes)
    }
}
