//! GitHub repositories and webhook reconciliation
//!
//! Repositories are listed through `gh repo list` in a single page; each
//! included repository becomes a [`WebhookTarget`].

pub mod webhook;

pub use webhook::WebhookTarget;

use anyhow::{Context, Result, bail};
use remote::{RemoteClient, Request};
use serde::Deserialize;

/// Fields requested from `gh repo list --json`
const REPO_FIELDS: &str = "name,isFork,isPrivate,description";

/// A repository as reported by `gh repo list`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    pub name: String,
    #[serde(default)]
    pub is_fork: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Result of listing and filtering repositories
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    /// Repositories kept, in listing order
    pub included: Vec<Repository>,
    /// Number of repositories dropped by the filter
    pub excluded: usize,
    /// Whether the listing hit the page limit
    pub truncated: bool,
}

impl Enumeration {
    pub fn listed(&self) -> usize {
        self.included.len() + self.excluded
    }
}

/// Default inclusion predicate: skip forks
pub fn is_own_repository(repo: &Repository) -> bool {
    !repo.is_fork
}

/// List an owner's repositories and apply the inclusion predicate
///
/// Any failure here is fatal for the run: without a listing nothing can be
/// reconciled. An empty array is a valid, empty listing.
pub fn enumerate<F>(
    client: &dyn RemoteClient,
    owner: &str,
    limit: usize,
    include: F,
) -> Result<Enumeration>
where
    F: Fn(&Repository) -> bool,
{
    let request = Request::cli([
        "repo".to_string(),
        "list".to_string(),
        owner.to_string(),
        "--limit".to_string(),
        limit.to_string(),
        "--json".to_string(),
        REPO_FIELDS.to_string(),
    ]);

    let payload = client
        .call(&request)
        .with_context(|| format!("Failed to fetch repositories for {owner}"))?;
    let Some(payload) = payload else {
        bail!("Failed to fetch repositories for {owner}: empty response");
    };

    let repos: Vec<Repository> = serde_json::from_value(payload)
        .with_context(|| format!("Unexpected repository listing format for {owner}"))?;

    let truncated = repos.len() >= limit;
    if truncated {
        log::warn!(
            "Listing returned {} repositories, the page limit; some may be missing",
            repos.len()
        );
    }

    let total = repos.len();
    let mut included = Vec::with_capacity(total);
    for repo in repos {
        if include(&repo) {
            included.push(repo);
        } else {
            log::debug!(
                "Skipping {} ({})",
                repo.name,
                repo.description.as_deref().unwrap_or("no description")
            );
        }
    }
    let excluded = total - included.len();
    log::info!("{owner}: {} included, {excluded} excluded", included.len());

    Ok(Enumeration {
        included,
        excluded,
        truncated,
    })
}
