use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fleetconf")]
#[command(version)]
#[command(about = "Bring remote platform configuration into a desired state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/fleetconf/config.toml)
    #[arg(short, long, global = true, env = "FLEETCONF_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ensure every repository of the owner has the configured webhook
    Webhooks(WebhooksArgs),

    /// Ensure the Cloudflare Access application, policies and service tokens exist
    Access(AccessArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Default)]
pub struct WebhooksArgs {
    /// Owner to reconcile (overrides github.owner)
    #[arg(long)]
    pub owner: Option<String>,

    /// Include forked repositories
    #[arg(long)]
    pub include_forks: bool,
}

#[derive(Args, Default)]
pub struct AccessArgs {
    /// Where to write issued token credentials (overrides access.tokens_file)
    #[arg(long)]
    pub tokens_file: Option<String>,
}
