mod cli;
mod cloudflare;
mod commands;
mod config;
mod engine;
mod github;
mod progress;
mod ui;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    /// Config file given on the command line or through `FLEETCONF_CONFIG`
    pub config_path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        config_path: cli.config,
    };

    match cli.command {
        Command::Webhooks(args) => commands::webhooks::run(&ctx, args),
        Command::Access(args) => commands::access::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "fleetconf", &mut io::stdout());
            Ok(())
        }
    }
}
