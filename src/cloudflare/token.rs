//! Service token target and the ledger of issued credentials

use anyhow::{Context, Result};
use reconcile::{ApplyError, Target};
use remote::{RemoteClient, Request};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ServiceTokenSpec;
use crate::engine::failure_to_apply_error;

/// Path of the service token collection, relative to the account base
pub const TOKENS_PATH: &str = "access/service_tokens";

/// Characters of a client secret shown on screen
pub const SECRET_PREVIEW_LEN: usize = 20;

/// Credentials returned when a service token is created
///
/// The secret is only ever returned once, at creation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub client_id: String,
    pub client_secret: String,
    pub name: String,
    pub id: String,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

/// Issued credentials keyed by project, shared across token targets
#[derive(Debug, Clone, Default)]
pub struct TokenLedger {
    tokens: Arc<Mutex<BTreeMap<String, IssuedToken>>>,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, IssuedToken>> {
        match self.tokens.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn record(&self, project: &str, token: IssuedToken) {
        self.lock().insert(project.to_string(), token);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the ledger, ordered by project
    pub fn entries(&self) -> Vec<(String, IssuedToken)> {
        self.lock()
            .iter()
            .map(|(project, token)| (project.clone(), token.clone()))
            .collect()
    }

    /// Write the ledger as pretty JSON, readable by the owner only
    ///
    /// Nothing is written when the ledger is empty. Returns the number of
    /// tokens written.
    pub fn write_to(&self, path: &Path) -> Result<usize> {
        let tokens = self.lock().clone();
        if tokens.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(&tokens)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        // The open mode only applies to new files; an existing one keeps its own
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
        }

        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        file.write_all(b"\n")?;

        Ok(tokens.len())
    }
}

/// Ensures a service token with the project's name exists
pub struct ServiceTokenTarget {
    spec: ServiceTokenSpec,
    ledger: TokenLedger,
    client: Arc<dyn RemoteClient>,
}

impl ServiceTokenTarget {
    pub fn new(spec: ServiceTokenSpec, ledger: TokenLedger, client: Arc<dyn RemoteClient>) -> Self {
        Self {
            spec,
            ledger,
            client,
        }
    }

    pub fn request_body(spec: &ServiceTokenSpec) -> Value {
        json!({
            "name": spec.token_name(),
            "duration": spec.duration,
        })
    }
}

impl fmt::Debug for ServiceTokenTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTokenTarget")
            .field("project", &self.spec.project)
            .field("name", &self.spec.token_name())
            .finish_non_exhaustive()
    }
}

impl Target for ServiceTokenTarget {
    fn id(&self) -> String {
        format!("token:{}", self.spec.project)
    }

    fn description(&self) -> String {
        format!(
            "Create service token '{}' ({})",
            self.spec.token_name(),
            self.spec.duration
        )
    }

    fn kind(&self) -> &'static str {
        "service_token"
    }

    fn is_compliant(&self) -> Result<bool> {
        let tokens = self
            .client
            .call(&Request::get(TOKENS_PATH))
            .context("Failed to list service tokens")?;

        let name = self.spec.token_name();
        Ok(tokens
            .as_ref()
            .and_then(Value::as_array)
            .is_some_and(|list| list.iter().any(|t| t["name"].as_str() == Some(name.as_str()))))
    }

    fn apply(&self) -> std::result::Result<(), ApplyError> {
        let request = Request::post(TOKENS_PATH, Self::request_body(&self.spec));
        let created = self
            .client
            .call(&request)
            .map_err(|e| failure_to_apply_error(&e))?;

        // The secret cannot be fetched again, so a created token without
        // credentials in the response is reported as a failure.
        let token: IssuedToken = created
            .and_then(|value| serde_json::from_value(value).ok())
            .ok_or_else(|| ApplyError::rejected("created, but credentials missing"))?;

        self.ledger.record(&self.spec.project, token);
        Ok(())
    }
}
