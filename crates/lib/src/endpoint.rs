//! Endpoint URIs: `scheme:path?key=value&...`.
//!
//! Components take their options out of the parsed URI one by one; whatever is
//! left over afterwards is an unknown option and rejected by `ensure_consumed`.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("invalid endpoint uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("unknown component {scheme:?} in {uri:?}")]
    UnknownComponent { scheme: String, uri: String },
    #[error("component {scheme:?} cannot be used as a {role} ({uri})")]
    WrongRole {
        scheme: String,
        role: &'static str,
        uri: String,
    },
    #[error("invalid value {value:?} for option {key:?} in {uri}")]
    InvalidOption {
        key: String,
        value: String,
        uri: String,
    },
    #[error("missing required option {key:?} in {uri}")]
    MissingOption { key: String, uri: String },
    #[error("unknown option(s) {keys} in {uri}")]
    UnknownOptions { keys: String, uri: String },
    #[error("invalid reference {0:?} (expected #class:<name>, #bean:<name> or #<name>)")]
    InvalidReference(String),
}

/// A parsed endpoint URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointUri {
    raw: String,
    scheme: String,
    path: String,
    params: BTreeMap<String, String>,
}

impl EndpointUri {
    pub fn parse(uri: &str) -> Result<Self, EndpointError> {
        let raw = uri.trim().to_string();
        let invalid = |reason: &str| EndpointError::InvalidUri {
            uri: raw.clone(),
            reason: reason.to_string(),
        };

        let (scheme, rest) = raw.split_once(':').ok_or_else(|| invalid("missing scheme"))?;
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("scheme must be lowercase letters, digits or '-'"));
        }
        let (path, query) = match rest.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (rest, None),
        };
        let path = path.trim_start_matches("//");
        if path.is_empty() {
            return Err(invalid("missing path"));
        }

        let mut params = BTreeMap::new();
        if let Some(q) = query {
            for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
                if k.is_empty() {
                    return Err(invalid("empty option name"));
                }
                if params.insert(k.to_string(), v.to_string()).is_some() {
                    return Err(invalid(&format!("duplicate option {:?}", k)));
                }
            }
        }

        Ok(Self {
            scheme: scheme.to_string(),
            path: path.to_string(),
            params,
            raw,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Remaining (not yet taken) options.
    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn take_str(&mut self, key: &str) -> Option<String> {
        self.params.remove(key)
    }

    pub fn take_u64(&mut self, key: &str) -> Result<Option<u64>, EndpointError> {
        self.take_parsed(key)
    }

    pub fn take_i64(&mut self, key: &str) -> Result<Option<i64>, EndpointError> {
        self.take_parsed(key)
    }

    pub fn take_bool(&mut self, key: &str) -> Result<Option<bool>, EndpointError> {
        self.take_parsed(key)
    }

    fn take_parsed<T: std::str::FromStr>(&mut self, key: &str) -> Result<Option<T>, EndpointError> {
        match self.params.remove(key) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| EndpointError::InvalidOption {
                    key: key.to_string(),
                    value,
                    uri: self.raw.clone(),
                }),
        }
    }

    /// Fails when options remain that no component consumed.
    pub fn ensure_consumed(&self) -> Result<(), EndpointError> {
        if self.params.is_empty() {
            return Ok(());
        }
        let keys: Vec<&str> = self.params.keys().map(String::as_str).collect();
        Err(EndpointError::UnknownOptions {
            keys: keys.join(", "),
            uri: self.raw.clone(),
        })
    }
}

impl fmt::Display for EndpointUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Reference to a registered object (e.g. an agent factory) from a URI option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeanRef {
    /// `#class:<name>`
    Class(String),
    /// `#bean:<name>` or `#<name>`
    Bean(String),
}

impl BeanRef {
    pub fn parse(s: &str) -> Result<Self, EndpointError> {
        let s = s.trim();
        let body = s
            .strip_prefix('#')
            .ok_or_else(|| EndpointError::InvalidReference(s.to_string()))?;
        let r = if let Some(name) = body.strip_prefix("class:") {
            BeanRef::Class(name.trim().to_string())
        } else if let Some(name) = body.strip_prefix("bean:") {
            BeanRef::Bean(name.trim().to_string())
        } else {
            BeanRef::Bean(body.trim().to_string())
        };
        if r.name().is_empty() {
            return Err(EndpointError::InvalidReference(s.to_string()));
        }
        Ok(r)
    }

    pub fn name(&self) -> &str {
        match self {
            BeanRef::Class(n) | BeanRef::Bean(n) => n,
        }
    }
}
