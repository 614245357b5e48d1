//! Cloudflare Access: application, policies and service tokens
//!
//! Everything hangs off one account-scoped [`HttpClient`](remote::HttpClient).
//! The application is reconciled first; its id is shared with the policy
//! targets through [`AccessState`], and issued token credentials are
//! collected in a [`TokenLedger`] for the artifact written after the run.

pub mod application;
pub mod policy;
pub mod token;

pub use application::ApplicationTarget;
pub use policy::PolicyTarget;
pub use token::{ServiceTokenTarget, TokenLedger};

use anyhow::{Context, Result};
use reconcile::BoxedTarget;
use remote::{RemoteClient, Request};
use serde::Deserialize;
use std::sync::{Arc, OnceLock};

use crate::config::AccessConfig;

/// Path of the application listing, relative to the account base
pub const APPS_PATH: &str = "access/apps";

/// An Access application as listed by the API
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccessApplication {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
}

/// List the account's Access applications
///
/// An absent result is an empty listing.
pub fn list_applications(client: &dyn RemoteClient) -> Result<Vec<AccessApplication>> {
    let payload = client
        .call(&Request::get(APPS_PATH))
        .context("Failed to list Access applications")?;

    match payload {
        Some(value) => {
            serde_json::from_value(value).context("Unexpected Access application listing format")
        }
        None => Ok(Vec::new()),
    }
}

/// Find the application serving `domain`
pub fn find_by_domain<'a>(
    apps: &'a [AccessApplication],
    domain: &str,
) -> Option<&'a AccessApplication> {
    apps.iter().find(|app| app.domain == domain)
}

/// List applications once and remember the one serving `domain`
///
/// This is the run's enumeration step: a failed listing means the account or
/// token is wrong, so the error is returned rather than treated as a pending
/// application.
pub fn discover_application(
    client: &dyn RemoteClient,
    domain: &str,
    state: &AccessState,
) -> Result<Option<AccessApplication>> {
    let apps = list_applications(client)?;
    let found = find_by_domain(&apps, domain).cloned();
    if let Some(app) = &found {
        let _ = state.app_id.set(app.id.clone());
    }
    Ok(found)
}

/// State shared between the Access targets of one run
#[derive(Debug, Clone, Default)]
pub struct AccessState {
    /// Id of the application, once found or created
    pub app_id: Arc<OnceLock<String>>,
    /// Credentials of tokens issued during the run
    pub ledger: TokenLedger,
}

impl AccessState {
    pub fn new() -> Self {
        Self {
            app_id: Arc::new(OnceLock::new()),
            ledger: TokenLedger::new(),
        }
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.get().map(String::as_str)
    }
}

/// Build the ordered target list: application, policies by precedence, tokens
pub fn targets(
    config: &AccessConfig,
    client: &Arc<dyn RemoteClient>,
    state: &AccessState,
) -> Vec<BoxedTarget> {
    let mut targets: Vec<BoxedTarget> = Vec::new();

    targets.push(Box::new(ApplicationTarget::new(
        config.application.clone(),
        Arc::clone(&state.app_id),
        Arc::clone(client),
    )));

    let mut policies = config.policies.clone();
    policies.sort_by_key(|p| p.precedence);
    for policy in policies {
        targets.push(Box::new(PolicyTarget::new(
            policy,
            Arc::clone(&state.app_id),
            Arc::clone(client),
        )));
    }

    for token in &config.service_tokens {
        targets.push(Box::new(ServiceTokenTarget::new(
            token.clone(),
            state.ledger.clone(),
            Arc::clone(client),
        )));
    }

    targets
}
