//! Client abstraction for remote platforms.
//!
//! The [`RemoteClient`] trait lets callers talk to a platform without knowing
//! whether requests go through a CLI or over HTTP, and lets tests swap in a
//! scripted fake.

use crate::error::Result;
use serde_json::Value;
use std::fmt;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Method name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }

    /// Whether the request changes remote state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single remote operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// REST call against the platform API. `path` is relative to the API base.
    Api {
        method: Method,
        path: String,
        body: Option<Value>,
    },
    /// Platform CLI subcommand whose stdout is JSON.
    Cli { args: Vec<String> },
}

impl Request {
    /// Read-only API call.
    pub fn get(path: impl Into<String>) -> Self {
        Self::Api {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    /// Mutating API call with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::Api {
            method: Method::Post,
            path: path.into(),
            body: Some(body),
        }
    }

    /// CLI subcommand.
    pub fn cli<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Cli {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the request changes remote state.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        match self {
            Self::Api { method, .. } => method.is_mutating(),
            Self::Cli { .. } => false,
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { method, path, .. } => write!(f, "{method} {path}"),
            Self::Cli { args } => write!(f, "{}", args.join(" ")),
        }
    }
}

/// Client trait for remote platforms.
///
/// Implementations must:
/// - return `Ok(None)` for an empty response body
/// - never retry; a mutating request reaches the platform exactly once
/// - report every failure as an [`crate::Error`], never panic
pub trait RemoteClient: Send + Sync {
    /// Perform the request and return the parsed payload.
    fn call(&self, request: &Request) -> Result<Option<Value>>;
}

/// Parse a response body, treating an empty body as absent.
pub fn parse_body(body: &str) -> Result<Option<Value>> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(trimmed)?))
}
