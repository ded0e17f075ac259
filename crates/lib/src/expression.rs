//! Expressions used by `setBody`, `setHeader` and `log` steps.
//!
//! `constant` yields its text as-is. `simple` interpolates `${...}` functions
//! against the current exchange: `body`, `header.<name>` (or `headers.<name>`),
//! `exchangeId` and `routeId`.

use crate::exchange::Exchange;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("unterminated ${{ in {0:?}")]
    Unterminated(String),
    #[error("unknown function ${{{function}}} in {template:?}")]
    UnknownFunction { function: String, template: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Constant(String),
    Simple(String),
}

/// Constant text expression.
pub fn constant(text: impl Into<String>) -> Expression {
    Expression::Constant(text.into())
}

/// Template expression in the simple language.
pub fn simple(template: impl Into<String>) -> Expression {
    Expression::Simple(template.into())
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Text(&'a str),
    Body,
    Header(&'a str),
    ExchangeId,
    RouteId,
}

fn parse(template: &str) -> Result<Vec<Segment<'_>>, ExpressionError> {
    let mut out = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        if start > 0 {
            out.push(Segment::Text(&rest[..start]));
        }
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| ExpressionError::Unterminated(template.to_string()))?;
        let function = after[..end].trim();
        let segment = match function {
            "body" | "in.body" => Segment::Body,
            "exchangeId" => Segment::ExchangeId,
            "routeId" => Segment::RouteId,
            f => match f
                .strip_prefix("header.")
                .or_else(|| f.strip_prefix("headers."))
            {
                Some(name) if !name.is_empty() => Segment::Header(name),
                _ => {
                    return Err(ExpressionError::UnknownFunction {
                        function: f.to_string(),
                        template: template.to_string(),
                    })
                }
            },
        };
        out.push(segment);
        rest = &after[end + 1..];
    }
    if !rest.is_empty() {
        out.push(Segment::Text(rest));
    }
    Ok(out)
}

impl Expression {
    /// Check the expression without an exchange (used when a route starts).
    pub fn validate(&self) -> Result<(), ExpressionError> {
        match self {
            Expression::Constant(_) => Ok(()),
            Expression::Simple(t) => parse(t).map(|_| ()),
        }
    }

    pub fn evaluate(&self, exchange: &Exchange) -> Result<String, ExpressionError> {
        let template = match self {
            Expression::Constant(text) => return Ok(text.clone()),
            Expression::Simple(t) => t,
        };
        let mut out = String::with_capacity(template.len());
        for segment in parse(template)? {
            match segment {
                Segment::Text(t) => out.push_str(t),
                Segment::Body => out.push_str(&exchange.message.body),
                Segment::Header(name) => {
                    out.push_str(exchange.message.header(name).unwrap_or(""))
                }
                Segment::ExchangeId => out.push_str(exchange.id()),
                Segment::RouteId => out.push_str(exchange.route_id()),
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(t) => write!(f, "constant({:?})", t),
            Expression::Simple(t) => write!(f, "simple({:?})", t),
        }
    }
}
