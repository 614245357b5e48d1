//! Target trait for reconciliation
//!
//! A Target is one remote entity together with the desired configuration
//! it should carry. It knows how to inspect itself and how to apply the
//! desired configuration.

use crate::types::ApplyError;
use anyhow::Result;
use std::fmt;

/// Core trait for reconciled targets
///
/// Every target provides:
/// - Identity (id, description, kind)
/// - A read-only compliance check
/// - A single additive mutation
///
/// # Example
///
/// ```ignore
/// use reconcile::{ApplyError, Target};
///
/// #[derive(Debug)]
/// struct Label { repo: String, name: String }
///
/// impl Target for Label {
///     fn id(&self) -> String {
///         self.repo.clone()
///     }
///
///     fn description(&self) -> String {
///         format!("Add label {} to {}", self.name, self.repo)
///     }
///
///     fn kind(&self) -> &'static str {
///         "label"
///     }
///
///     fn is_compliant(&self) -> anyhow::Result<bool> {
///         Ok(fetch_labels(&self.repo)?.contains(&self.name))
///     }
///
///     fn apply(&self) -> Result<(), ApplyError> {
///         create_label(&self.repo, &self.name).map_err(|e| ApplyError::rejected(e.to_string()))
///     }
/// }
/// ```
pub trait Target: Send + Sync + fmt::Debug {
    /// Stable identifier, unique within the run (repo name, domain, token name)
    fn id(&self) -> String;

    /// Human-readable description of the mutation
    fn description(&self) -> String;

    /// Target category, used for grouping output
    fn kind(&self) -> &'static str;

    /// Check whether the remote state already matches the desired configuration
    ///
    /// Must not mutate remote state. Errors are treated as non-compliant by
    /// the planner.
    fn is_compliant(&self) -> Result<bool>;

    /// Apply the desired configuration
    ///
    /// Called at most once per run. Implementations must classify remote
    /// failures into [`ApplyError`] kinds; the executor does not look at
    /// message text.
    fn apply(&self) -> std::result::Result<(), ApplyError>;
}

/// A boxed target for type-erased storage
pub type BoxedTarget = Box<dyn Target>;
