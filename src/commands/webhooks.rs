//! `fleetconf webhooks`

use anyhow::Result;
use reconcile::{BoxedTarget, ConfirmCallback, Pacer, RunReport};
use remote::{GhCli, RemoteClient};
use std::sync::Arc;

use crate::Context;
use crate::cli::WebhooksArgs;
use crate::commands::{inspect, load_config, pacer};
use crate::config::Config;
use crate::engine::{ConsoleProgress, InteractiveGate, print_report};
use crate::github::{self, Enumeration, WebhookTarget};
use crate::{progress, ui};

const NOUN: &str = "repositories";

pub fn run(ctx: &Context, args: WebhooksArgs) -> Result<()> {
    let mut config = load_config(ctx)?;
    if let Some(owner) = args.owner {
        config.github.owner = owner;
    }
    if args.include_forks {
        config.github.include_forks = true;
    }
    config.validate_webhooks()?;

    if !ctx.quiet {
        ui::header("Repository Webhooks");
        ui::kv("Owner", &config.github.owner);
        ui::kv("Webhook", &config.webhook.url);
    }

    let client: Arc<dyn RemoteClient> = Arc::new(GhCli::new());
    let mut gate = InteractiveGate::new(NOUN, desired_lines(&config));
    let report = reconcile_webhooks(&config, &client, &mut gate, &mut pacer(&config))?;

    print_report(&report, NOUN, &config.webhook.follow_up);
    Ok(())
}

/// Enumerate, inspect, confirm and apply
pub fn reconcile_webhooks<C, D>(
    config: &Config,
    client: &Arc<dyn RemoteClient>,
    confirm: &mut C,
    pacer: &mut D,
) -> Result<RunReport>
where
    C: ConfirmCallback,
    D: Pacer,
{
    let listing = list_repositories(config, client.as_ref())?;
    if listing.included.is_empty() {
        ui::info("No repositories to reconcile");
    }

    let targets = build_targets(config, client, listing);
    let plan = inspect(targets, NOUN);

    reconcile::execute(&plan, confirm, &mut ConsoleProgress, pacer)
}

fn list_repositories(config: &Config, client: &dyn RemoteClient) -> Result<Enumeration> {
    let owner = &config.github.owner;
    let pb = progress::spinner(&format!("Listing repositories for {owner}..."));

    let include_forks = config.github.include_forks;
    let result = github::enumerate(client, owner, config.github.repo_limit, |repo| {
        include_forks || github::is_own_repository(repo)
    });

    match result {
        Ok(listing) => {
            progress::finish_success(
                &pb,
                &format!(
                    "{} repositories listed, {} included",
                    listing.listed(),
                    listing.included.len()
                ),
            );
            if listing.truncated {
                ui::warn(&format!(
                    "Listing hit the limit of {}; raise github.repo_limit to see more",
                    config.github.repo_limit
                ));
            }
            Ok(listing)
        }
        Err(e) => {
            progress::finish_error(&pb, "Could not list repositories");
            Err(e)
        }
    }
}

fn build_targets(
    config: &Config,
    client: &Arc<dyn RemoteClient>,
    listing: Enumeration,
) -> Vec<BoxedTarget> {
    let spec = Arc::new(config.webhook.clone());
    listing
        .included
        .into_iter()
        .map(|repo| {
            Box::new(WebhookTarget::new(
                &config.github.owner,
                repo,
                Arc::clone(&spec),
                Arc::clone(client),
            )) as BoxedTarget
        })
        .collect()
}

fn desired_lines(config: &Config) -> Vec<String> {
    vec![
        format!("URL:          {}", config.webhook.url),
        format!("Events:       {}", config.webhook.events.join(", ")),
        format!("Content type: {}", config.webhook.content_type),
    ]
}
