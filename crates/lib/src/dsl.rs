//! Route files: YAML or JSON lists of route definitions.
//!
//! ```yaml
//! - route:
//!     id: startup
//!     from: "timer:startup?delay=2000&repeatCount=1"
//!     steps:
//!       - setBody:
//!           constant: "My name is Alice"
//!       - setHeader:
//!           name: memoryId
//!           constant: "1"
//!       - to: "agent:test-memory-agent?agentFactory=#class:DefaultAgentFactory"
//!       - log: "${body}"
//! ```

use crate::expression::Expression;
use crate::route::{RouteDefinitions, Step};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteEntry {
    route: RouteSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RouteSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    from: String,
    #[serde(default)]
    steps: Vec<StepSpec>,
}

/// Exactly one field is set per step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StepSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    set_body: Option<ExpressionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    set_header: Option<HeaderSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log: Option<String>,
}

/// Exactly one of `constant` / `simple`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExpressionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    simple: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct HeaderSpec {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    simple: Option<String>,
}

fn expression(constant: Option<String>, simple: Option<String>) -> Result<Expression> {
    match (constant, simple) {
        (Some(t), None) => Ok(Expression::Constant(t)),
        (None, Some(t)) => Ok(Expression::Simple(t)),
        _ => bail!("expression needs exactly one of `constant` or `simple`"),
    }
}

fn step(spec: StepSpec) -> Result<Step> {
    let StepSpec {
        set_body,
        set_header,
        to,
        log,
    } = spec;
    match (set_body, set_header, to, log) {
        (Some(e), None, None, None) => Ok(Step::SetBody(expression(e.constant, e.simple)?)),
        (None, Some(h), None, None) => Ok(Step::SetHeader {
            value: expression(h.constant, h.simple)
                .with_context(|| format!("setHeader {}", h.name))?,
            name: h.name,
        }),
        (None, None, Some(uri), None) => Ok(Step::To(uri)),
        (None, None, None, Some(t)) => Ok(Step::Log(Expression::Simple(t))),
        _ => bail!("each step needs exactly one of setBody, setHeader, to, log"),
    }
}

fn into_definitions(entries: Vec<RouteEntry>) -> Result<RouteDefinitions> {
    let mut routes = RouteDefinitions::new();
    for (n, entry) in entries.into_iter().enumerate() {
        let spec = entry.route;
        let route = routes.from(spec.from);
        if let Some(id) = spec.id.filter(|s| !s.trim().is_empty()) {
            route.route_id(id);
        }
        let label = route
            .id()
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", n + 1));
        for (i, s) in spec.steps.into_iter().enumerate() {
            let parsed = step(s).with_context(|| format!("route {} step {}", label, i + 1))?;
            route.push_step(parsed);
        }
    }
    Ok(routes)
}

pub fn parse_routes_yaml(text: &str) -> Result<RouteDefinitions> {
    let entries: Vec<RouteEntry> = serde_yaml::from_str(text).context("parsing yaml routes")?;
    into_definitions(entries)
}

pub fn parse_routes_json(text: &str) -> Result<RouteDefinitions> {
    let entries: Vec<RouteEntry> = serde_json::from_str(text).context("parsing json routes")?;
    into_definitions(entries)
}

/// Load a route file; `.json` is parsed as JSON, anything else as YAML.
pub fn load_routes_file(path: &Path) -> Result<RouteDefinitions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading routes from {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let routes = if is_json {
        parse_routes_json(&text)
    } else {
        parse_routes_yaml(&text)
    }
    .with_context(|| format!("loading routes from {}", path.display()))?;
    log::debug!("loaded {} route(s) from {}", routes.len(), path.display());
    Ok(routes)
}

/// Render definitions back to YAML (used by `conduit routes --yaml`).
pub fn to_yaml(routes: &RouteDefinitions) -> Result<String> {
    let entries: Vec<RouteEntry> = routes
        .iter()
        .map(|r| RouteEntry {
            route: RouteSpec {
                id: r.id().map(str::to_string),
                from: r.from_uri().to_string(),
                steps: r.steps().iter().map(step_spec).collect(),
            },
        })
        .collect();
    serde_yaml::to_string(&entries).context("rendering routes as yaml")
}

fn step_spec(step: &Step) -> StepSpec {
    let split = |e: &Expression| match e {
        Expression::Constant(t) => (Some(t.clone()), None),
        Expression::Simple(t) => (None, Some(t.clone())),
    };
    match step {
        Step::SetBody(e) => {
            let (constant, simple) = split(e);
            StepSpec {
                set_body: Some(ExpressionSpec { constant, simple }),
                ..Default::default()
            }
        }
        Step::SetHeader { name, value } => {
            let (constant, simple) = split(value);
            StepSpec {
                set_header: Some(HeaderSpec {
                    name: name.clone(),
                    constant,
                    simple,
                }),
                ..Default::default()
            }
        }
        Step::To(uri) => StepSpec {
            to: Some(uri.clone()),
            ..Default::default()
        },
        Step::Log(Expression::Simple(t)) | Step::Log(Expression::Constant(t)) => StepSpec {
            log: Some(t.clone()),
            ..Default::default()
        },
    }
}
