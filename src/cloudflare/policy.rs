//! Access policy target

use anyhow::{Context, Result};
use reconcile::{ApplyError, Target};
use remote::{RemoteClient, Request};
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::APPS_PATH;
use crate::config::PolicySpec;
use crate::engine::failure_to_apply_error;

/// Ensures a named policy exists on the Access application
pub struct PolicyTarget {
    spec: PolicySpec,
    app_id: Arc<OnceLock<String>>,
    client: Arc<dyn RemoteClient>,
}

impl PolicyTarget {
    pub fn new(
        spec: PolicySpec,
        app_id: Arc<OnceLock<String>>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            spec,
            app_id,
            client,
        }
    }

    pub fn request_body(spec: &PolicySpec) -> Value {
        json!({
            "name": spec.name,
            "decision": spec.decision,
            "include": spec.include,
            "precedence": spec.precedence,
        })
    }

    fn policies_path(app_id: &str) -> String {
        format!("{APPS_PATH}/{app_id}/policies")
    }
}

impl fmt::Debug for PolicyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolicyTarget")
            .field("name", &self.spec.name)
            .field("precedence", &self.spec.precedence)
            .finish_non_exhaustive()
    }
}

impl Target for PolicyTarget {
    fn id(&self) -> String {
        format!("policy:{}", self.spec.name)
    }

    fn description(&self) -> String {
        format!(
            "Create policy '{}' ({}, precedence {})",
            self.spec.name, self.spec.decision, self.spec.precedence
        )
    }

    fn kind(&self) -> &'static str {
        "access_policy"
    }

    fn is_compliant(&self) -> Result<bool> {
        // No application yet means no policies either
        let Some(app_id) = self.app_id.get() else {
            return Ok(false);
        };

        let policies = self
            .client
            .call(&Request::get(Self::policies_path(app_id)))
            .with_context(|| format!("Failed to list policies for application {app_id}"))?;

        Ok(policies
            .as_ref()
            .and_then(Value::as_array)
            .is_some_and(|list| {
                list.iter()
                    .any(|p| p["name"].as_str() == Some(self.spec.name.as_str()))
            }))
    }

    fn apply(&self) -> std::result::Result<(), ApplyError> {
        let Some(app_id) = self.app_id.get() else {
            return Err(ApplyError::rejected("application id unavailable"));
        };

        let request = Request::post(Self::policies_path(app_id), Self::request_body(&self.spec));
        self.client
            .call(&request)
            .map(|_| ())
            .map_err(|e| failure_to_apply_error(&e))
    }
}
