//! Provider traits for the confirmation gate, progress reporting and pacing
//!
//! These traits let the engine run without depending on a specific
//! terminal UI or clock.

use crate::planner::Plan;
use crate::target::Target;
use crate::types::MutationOutcome;
use anyhow::Result;
use std::thread;
use std::time::Duration;

/// Delay between mutation calls when none is configured
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

/// Confirmation callback for the operator
///
/// Implementations render the plan and block on a single yes/no answer.
/// Anything other than an explicit yes must return `false`.
pub trait ConfirmCallback {
    fn confirm(&mut self, plan: &Plan) -> Result<bool>;
}

/// Progress callback for the mutation phase
pub trait ProgressCallback {
    /// Called before a target is applied; `index` is 1-based
    fn on_start(&mut self, index: usize, total: usize, target: &dyn Target);

    /// Called after a target's outcome is known
    fn on_complete(&mut self, id: &str, outcome: &MutationOutcome);
}

/// Rate limiting between mutation calls
pub trait Pacer {
    /// Called after every mutation attempt, whatever its outcome
    fn pause(&mut self);
}

/// Sleep a fixed interval after each call
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        Self(DEFAULT_DELAY)
    }
}

impl Pacer for FixedDelay {
    fn pause(&mut self) {
        thread::sleep(self.0);
    }
}

/// No delay (tests)
pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&mut self) {}
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_start(&mut self, _index: usize, _total: usize, _target: &dyn Target) {}
    fn on_complete(&mut self, _id: &str, _outcome: &MutationOutcome) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _plan: &Plan) -> Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _plan: &Plan) -> Result<bool> {
        Ok(false)
    }
}
