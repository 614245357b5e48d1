//! Repository webhook target

use anyhow::{Context, Result};
use reconcile::{ApplyError, Target};
use remote::{RemoteClient, Request};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

use super::Repository;
use crate::config::WebhookSpec;
use crate::engine::failure_to_apply_error;

/// Ensures a repository has a webhook pointing at the desired URL
pub struct WebhookTarget {
    owner: String,
    repo: Repository,
    spec: Arc<WebhookSpec>,
    client: Arc<dyn RemoteClient>,
}

impl WebhookTarget {
    pub fn new(
        owner: &str,
        repo: Repository,
        spec: Arc<WebhookSpec>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            repo,
            spec,
            client,
        }
    }

    fn hooks_path(&self) -> String {
        format!("repos/{}/{}/hooks", self.owner, self.repo.name)
    }

    /// Request body for creating the webhook
    pub fn request_body(spec: &WebhookSpec) -> Value {
        json!({
            "name": "web",
            "active": true,
            "events": spec.events,
            "config": {
                "url": spec.url,
                "content_type": spec.content_type,
                "insecure_ssl": "0"
            }
        })
    }
}

impl fmt::Debug for WebhookTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookTarget")
            .field("owner", &self.owner)
            .field("repo", &self.repo.name)
            .field("url", &self.spec.url)
            .finish_non_exhaustive()
    }
}

impl Target for WebhookTarget {
    fn id(&self) -> String {
        self.repo.name.clone()
    }

    fn description(&self) -> String {
        let visibility = if self.repo.is_private { " (private)" } else { "" };
        format!(
            "Add webhook {} to {}/{}{visibility}",
            self.spec.url, self.owner, self.repo.name
        )
    }

    fn kind(&self) -> &'static str {
        "webhook"
    }

    fn is_compliant(&self) -> Result<bool> {
        let hooks = self
            .client
            .call(&Request::get(self.hooks_path()))
            .with_context(|| format!("Failed to list hooks for {}", self.repo.name))?;

        Ok(has_hook_for(hooks.as_ref(), &self.spec.url))
    }

    fn apply(&self) -> std::result::Result<(), ApplyError> {
        let request = Request::post(self.hooks_path(), Self::request_body(&self.spec));
        self.client
            .call(&request)
            .map(|_| ())
            .map_err(|e| failure_to_apply_error(&e))
    }
}

/// Whether any hook in the listing targets `url`
fn has_hook_for(hooks: Option<&Value>, url: &str) -> bool {
    hooks
        .and_then(Value::as_array)
        .is_some_and(|hooks| hooks.iter().any(|h| h["config"]["url"].as_str() == Some(url)))
}
