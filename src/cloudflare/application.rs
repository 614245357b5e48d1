//! Access application target

use anyhow::Result;
use reconcile::{ApplyError, Target};
use remote::{RemoteClient, Request};
use serde_json::{Value, json};
use std::fmt;
use std::sync::{Arc, OnceLock};

use super::{APPS_PATH, find_by_domain, list_applications};
use crate::config::ApplicationSpec;
use crate::engine::failure_to_apply_error;

/// Ensures an Access application exists for the configured domain
///
/// The application id, once known, is published through `app_id` for the
/// policy targets that follow.
pub struct ApplicationTarget {
    spec: ApplicationSpec,
    app_id: Arc<OnceLock<String>>,
    client: Arc<dyn RemoteClient>,
}

impl ApplicationTarget {
    pub fn new(
        spec: ApplicationSpec,
        app_id: Arc<OnceLock<String>>,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            spec,
            app_id,
            client,
        }
    }

    pub fn request_body(spec: &ApplicationSpec) -> Value {
        json!({
            "name": spec.name,
            "domain": spec.domain,
            "type": spec.app_type,
            "session_duration": spec.session_duration,
            "auto_redirect_to_identity": spec.auto_redirect_to_identity,
            "cors_headers": spec.cors_headers,
        })
    }

    fn remember(&self, id: &str) {
        if self.app_id.set(id.to_string()).is_ok() {
            log::debug!("Access application for {}: {id}", self.spec.domain);
        }
    }

    /// Look the application up by domain after creation reported a conflict
    fn resolve_existing(&self) {
        match list_applications(self.client.as_ref()) {
            Ok(apps) => match find_by_domain(&apps, &self.spec.domain) {
                Some(app) => self.remember(&app.id),
                None => log::warn!(
                    "Application for {} reported as existing but not listed",
                    self.spec.domain
                ),
            },
            Err(e) => log::warn!("Could not resolve existing application: {e:#}"),
        }
    }
}

impl fmt::Debug for ApplicationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationTarget")
            .field("name", &self.spec.name)
            .field("domain", &self.spec.domain)
            .finish_non_exhaustive()
    }
}

impl Target for ApplicationTarget {
    fn id(&self) -> String {
        format!("application:{}", self.spec.domain)
    }

    fn description(&self) -> String {
        format!(
            "Create Access application '{}' for {}",
            self.spec.name, self.spec.domain
        )
    }

    fn kind(&self) -> &'static str {
        "access_application"
    }

    fn is_compliant(&self) -> Result<bool> {
        if self.app_id.get().is_some() {
            return Ok(true);
        }

        let apps = list_applications(self.client.as_ref())?;
        match find_by_domain(&apps, &self.spec.domain) {
            Some(app) => {
                self.remember(&app.id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn apply(&self) -> std::result::Result<(), ApplyError> {
        let request = Request::post(APPS_PATH, Self::request_body(&self.spec));

        match self.client.call(&request) {
            Ok(created) => {
                match created.as_ref().and_then(|v| v["id"].as_str()) {
                    Some(id) => self.remember(id),
                    None => log::warn!("Created application response carried no id"),
                }
                Ok(())
            }
            Err(e) => {
                let err = failure_to_apply_error(&e);
                if err.is_conflict() {
                    self.resolve_existing();
                }
                Err(err)
            }
        }
    }
}
