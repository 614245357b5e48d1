//! # Reconcile
//!
//! Idempotent bulk reconciliation of remote resources.
//!
//! This crate provides the engine that compares remote state against a
//! desired configuration and applies additive mutations where they diverge.
//!
//! ## Core Concepts
//!
//! - **Target**: A remote entity plus the configuration it should carry
//! - **Plan**: Targets partitioned into compliant and pending
//! - **Gate**: Operator approval before any mutation
//! - **Executor**: Applies pending targets one at a time, with a fixed delay
//! - **RunSummary**: Counts of created, already-existing and failed mutations
//!
//! ## Example
//!
//! ```ignore
//! use reconcile::{run, AutoConfirm, FixedDelay, NoProgress, RunReport};
//!
//! let targets = repos.into_iter().map(|r| webhook_target(r)).collect();
//! match run(targets, &mut AutoConfirm, &mut NoProgress, &mut FixedDelay::default())? {
//!     RunReport::NothingToDo { compliant } => println!("{compliant} already configured"),
//!     RunReport::Declined { .. } => println!("No changes made"),
//!     RunReport::Applied { summary, .. } => println!("{} created", summary.created),
//! }
//! ```
//!
//! ## Provider Traits
//!
//! - [`ConfirmCallback`]: Renders the plan and asks for approval
//! - [`ProgressCallback`]: Receives per-target progress
//! - [`Pacer`]: Delay between mutation calls
//!
//! Execution is sequential by design: remote APIs are rate limited and the
//! output order must match the enumeration order.

pub mod context;
pub mod executor;
pub mod planner;
pub mod target;
pub mod types;

// Re-export main types at crate root
pub use context::{
    AutoConfirm, AutoDecline, ConfirmCallback, DEFAULT_DELAY, FixedDelay, NoDelay, NoProgress,
    Pacer, ProgressCallback,
};
pub use executor::{apply, execute, run};
pub use planner::{Plan, plan};
pub use target::{BoxedTarget, Target};
pub use types::{
    ApplyError, ComplianceStatus, FailureKind, MAX_REASON_LEN, MutationOutcome, RunReport,
    RunSummary, truncate_reason,
};
