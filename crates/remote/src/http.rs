//! HTTP JSON backend for Cloudflare-style v4 APIs.
//!
//! Responses are wrapped in an envelope:
//!
//! ```json
//! { "success": true, "errors": [], "messages": [], "result": { ... } }
//! ```
//!
//! [`HttpClient`] unwraps it and returns `result`. Failures carry the first
//! error message and the HTTP status so callers can classify them.

use crate::client::{Method, RemoteClient, Request, parse_body};
use crate::error::{Error, Result};
use serde_json::Value;

/// Bearer-token HTTP client.
pub struct HttpClient {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// API base URL, e.g. `https://api.cloudflare.com/client/v4/accounts/<id>`.
    api_base: String,
    /// API token sent as `Authorization: Bearer`.
    token: String,
}

impl HttpClient {
    /// Create a client for the given API base and token.
    #[must_use]
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        // Non-2xx bodies carry the error details, so statuses are inspected
        // here instead of being turned into `ureq::Error::StatusCode`.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        let agent: ureq::Agent = config.into();

        Self {
            agent,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build the full URL for a relative path.
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl RemoteClient for HttpClient {
    fn call(&self, request: &Request) -> Result<Option<Value>> {
        let Request::Api { method, path, body } = request else {
            return Err(Error::Unsupported(format!(
                "HTTP client cannot run CLI request: {request}"
            )));
        };

        let url = self.url(path);
        let auth = format!("Bearer {}", self.token);
        log::debug!("{method} {url}");

        let mut response = match (method, body) {
            (Method::Get, _) => self
                .agent
                .get(&url)
                .header("Authorization", auth.as_str())
                .header("Accept", "application/json")
                .call()?,
            (Method::Post, Some(body)) => self
                .agent
                .post(&url)
                .header("Authorization", auth.as_str())
                .header("Accept", "application/json")
                .send_json(body)?,
            (Method::Post, None) => self
                .agent
                .post(&url)
                .header("Authorization", auth.as_str())
                .header("Accept", "application/json")
                .send_empty()?,
        };

        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        unwrap_envelope(status, &text)
    }
}

/// Unwrap a v4 response envelope.
fn unwrap_envelope(status: u16, text: &str) -> Result<Option<Value>> {
    let ok_status = (200..300).contains(&status);

    let payload = match parse_body(text) {
        Ok(payload) => payload,
        Err(e) if ok_status => return Err(e),
        Err(_) => return Err(Error::api(Some(status), format!("HTTP {status}"))),
    };

    let Some(payload) = payload else {
        return if ok_status {
            Ok(None)
        } else {
            Err(Error::api(Some(status), format!("HTTP {status}")))
        };
    };

    let reported_failure = payload["success"].as_bool() == Some(false);
    if !ok_status || reported_failure {
        let message = first_error_message(&payload).unwrap_or_else(|| format!("HTTP {status}"));
        return Err(Error::api(Some(status), message));
    }

    match payload {
        Value::Object(mut envelope) if envelope.contains_key("result") => {
            match envelope.remove("result") {
                Some(Value::Null) | None => Ok(None),
                Some(result) => Ok(Some(result)),
            }
        }
        other => Ok(Some(other)),
    }
}

/// First `errors[].message` of an envelope.
fn first_error_message(payload: &Value) -> Option<String> {
    payload["errors"]
        .as_array()?
        .iter()
        .find_map(|e| e["message"].as_str())
        .map(str::to_string)
}
