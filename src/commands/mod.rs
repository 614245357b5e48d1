pub mod access;
pub mod webhooks;

use anyhow::Result;
use reconcile::{FixedDelay, Plan};

use crate::Context;
use crate::config::{self, Config};
use crate::progress;

/// Load the config from `--config` or the default location
pub fn load_config(ctx: &Context) -> Result<Config> {
    let path = match &ctx.config_path {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    log::debug!("Loading config from {}", path.display());
    Config::load(&path)
}

/// Inspect every target under a spinner
pub fn inspect(targets: Vec<reconcile::BoxedTarget>, noun: &str) -> Plan {
    let pb = progress::spinner(&format!("Inspecting {} {noun}...", targets.len()));
    let plan = reconcile::plan(targets);
    progress::finish_success(
        &pb,
        &format!(
            "{} compliant, {} pending",
            plan.compliant.len(),
            plan.pending.len()
        ),
    );
    plan
}

/// Pause between mutation calls, from `[rate_limit]`
pub fn pacer(config: &Config) -> FixedDelay {
    FixedDelay(config.rate_limit.delay())
}
