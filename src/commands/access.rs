//! `fleetconf access`

use anyhow::{Context as _, Result};
use colored::Colorize;
use reconcile::{ConfirmCallback, Pacer, RunReport};
use remote::{HttpClient, RemoteClient};
use std::path::Path;
use std::sync::Arc;

use crate::Context;
use crate::cli::AccessArgs;
use crate::cloudflare::{self, AccessState, TokenLedger, token::SECRET_PREVIEW_LEN};
use crate::commands::{inspect, load_config, pacer};
use crate::config::{Config, expand_path};
use crate::engine::{ConsoleProgress, InteractiveGate, print_report};
use crate::{progress, ui};

const NOUN: &str = "access items";

pub fn run(ctx: &Context, args: AccessArgs) -> Result<()> {
    let mut config = load_config(ctx)?;
    if let Some(path) = args.tokens_file {
        config.access.tokens_file = path;
    }
    config.validate_access()?;

    if !ctx.quiet {
        ui::header("Cloudflare Access");
        ui::kv("Account", &config.cloudflare.account_id);
        ui::kv("Domain", &config.access.application.domain);
    }

    let client: Arc<dyn RemoteClient> = Arc::new(HttpClient::new(
        config.cloudflare.account_base(),
        config.cloudflare.api_token.clone(),
    ));
    let state = AccessState::new();
    let mut gate = InteractiveGate::new(NOUN, desired_lines(&config));

    let report = reconcile_access(&config, &client, &state, &mut gate, &mut pacer(&config))?;
    print_report(&report, NOUN, &config.access.follow_up);

    if let Some(app_id) = state.app_id() {
        ui::kv("Application ID", app_id);
    }
    print_issued(&state.ledger);

    let path = expand_path(&config.access.tokens_file);
    save_tokens(&state.ledger, &path)?;

    Ok(())
}

/// Inspect, confirm and apply the Access targets in dependency order
pub fn reconcile_access<C, D>(
    config: &Config,
    client: &Arc<dyn RemoteClient>,
    state: &AccessState,
    confirm: &mut C,
    pacer: &mut D,
) -> Result<RunReport>
where
    C: ConfirmCallback,
    D: Pacer,
{
    discover(config, client.as_ref(), state)?;

    let targets = cloudflare::targets(&config.access, client, state);
    let plan = inspect(targets, NOUN);
    reconcile::execute(&plan, confirm, &mut ConsoleProgress, pacer)
}

/// Fatal enumeration step: the account must be listable before anything is planned
fn discover(config: &Config, client: &dyn RemoteClient, state: &AccessState) -> Result<()> {
    let domain = &config.access.application.domain;
    let pb = progress::spinner("Listing Access applications...");

    match cloudflare::discover_application(client, domain, state) {
        Ok(Some(app)) => {
            progress::finish_success(&pb, &format!("Found application '{}' ({})", app.name, app.id));
            Ok(())
        }
        Ok(None) => {
            progress::finish_success(&pb, &format!("No application for {domain} yet"));
            Ok(())
        }
        Err(e) => {
            progress::finish_error(&pb, "Could not list Access applications");
            Err(e)
        }
    }
}

/// Write issued credentials; nothing happens when no token was created
fn save_tokens(ledger: &TokenLedger, path: &Path) -> Result<()> {
    let written = ledger
        .write_to(path)
        .with_context(|| format!("Failed to save service tokens to {}", path.display()))?;
    if written > 0 {
        println!();
        println!(
            "  {} {written} token(s) saved to {}",
            "✓".green(),
            path.display()
        );
        ui::warn("This file contains secrets; keep it out of version control");
    }
    Ok(())
}

fn print_issued(ledger: &TokenLedger) {
    if ledger.is_empty() {
        return;
    }

    println!();
    println!(
        "{}",
        format!("Service tokens issued ({})", ledger.len()).cyan().bold()
    );
    for (project, token) in ledger.entries() {
        println!("  {}", project.bold());
        ui::kv("Client ID", &token.client_id);
        ui::kv(
            "Client Secret",
            &ui::preview_secret(&token.client_secret, SECRET_PREVIEW_LEN),
        );
    }
}

fn desired_lines(config: &Config) -> Vec<String> {
    let app = &config.access.application;
    let mut lines = vec![
        format!("Application: {} ({})", app.name, app.domain),
        format!("Session:     {}", app.session_duration),
    ];
    if !config.access.policies.is_empty() {
        let names: Vec<&str> = config
            .access
            .policies
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        lines.push(format!("Policies:    {}", names.join(", ")));
    }
    if !config.access.service_tokens.is_empty() {
        let projects: Vec<&str> = config
            .access
            .service_tokens
            .iter()
            .map(|t| t.project.as_str())
            .collect();
        lines.push(format!("Tokens:      {}", projects.join(", ")));
    }
    lines
}
