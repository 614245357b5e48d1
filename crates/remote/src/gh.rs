//! GitHub backend using the `gh` CLI.
//!
//! API requests become `gh api <path> -X <METHOD>`, with the JSON body fed
//! through stdin (`--input -`). Authentication is whatever `gh auth` holds.

use crate::client::{RemoteClient, Request, parse_body};
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Output, Stdio};
use std::sync::LazyLock;

/// `gh` reports HTTP failures as "... (HTTP 422)".
static HTTP_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(HTTP (\d{3})\)").expect("valid status pattern"));

/// Backend that executes real `gh` commands.
#[derive(Debug, Clone)]
pub struct GhCli {
    /// Path or name of the gh executable
    program: String,
}

impl GhCli {
    /// Create a backend that runs `gh` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program("gh")
    }

    /// Create a backend with a custom executable (for testing).
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Argument vector and stdin payload for a request.
    fn command_line(request: &Request) -> Result<(Vec<String>, Option<String>)> {
        match request {
            Request::Api { method, path, body } => {
                let mut args = vec![
                    "api".to_string(),
                    path.clone(),
                    "-X".to_string(),
                    method.as_str().to_string(),
                ];
                let stdin = match body {
                    Some(body) => {
                        args.push("--input".to_string());
                        args.push("-".to_string());
                        Some(serde_json::to_string(body)?)
                    }
                    None => None,
                };
                Ok((args, stdin))
            }
            Request::Cli { args } => Ok((args.clone(), None)),
        }
    }

    /// Run gh with optional stdin and capture the output.
    fn run(&self, args: &[String], stdin: Option<&str>) -> Result<Output> {
        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Transport(format!("failed to execute {}: {e}", self.program)))?;

        // gh may exit before reading its input (e.g. on an auth failure). The
        // child is still reaped so its own stderr explains the failure.
        let written = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => pipe.write_all(input.as_bytes()),
            _ => Ok(()),
        };

        let output = child.wait_with_output()?;
        if let Err(e) = written {
            log::debug!("writing request body to {} failed: {e}", self.program);
            if output.status.success() {
                return Err(Error::Transport(format!("failed to send request body: {e}")));
            }
        }
        Ok(output)
    }

    /// Run gh and turn its output into a payload or a classified error.
    fn execute(&self, args: &[String], stdin: Option<&str>) -> Result<Option<Value>> {
        let output = self.run(args, stdin)?;
        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failure_from_output(&stdout, &stderr));
        }

        parse_body(&stdout)
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteClient for GhCli {
    fn call(&self, request: &Request) -> Result<Option<Value>> {
        let (args, stdin) = Self::command_line(request)?;
        log::debug!("gh {}", args.join(" "));
        self.execute(&args, stdin.as_deref())
    }
}

/// Build an API error from a failed gh invocation.
///
/// stderr carries the summary line; on HTTP failures stdout carries the
/// response body, whose `errors[].message` entries hold the details.
fn failure_from_output(stdout: &str, stderr: &str) -> Error {
    let status = HTTP_STATUS
        .captures(stderr)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok());

    let mut message = stderr.trim().to_string();
    for detail in error_details(stdout) {
        if !message.contains(&detail) {
            if !message.is_empty() {
                message.push_str(": ");
            }
            message.push_str(&detail);
        }
    }

    if message.is_empty() {
        message = "gh exited with a failure status".to_string();
    }

    Error::api(status, message)
}

/// Extract `errors[].message` from a GitHub error body, if any.
fn error_details(body: &str) -> Vec<String> {
    let Ok(Some(json)) = parse_body(body) else {
        return Vec::new();
    };

    json["errors"]
        .as_array()
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| e["message"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
