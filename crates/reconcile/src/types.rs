//! Core types for reconciliation runs

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length of a failure reason kept for display.
pub const MAX_REASON_LEN: usize = 50;

/// Whether a target already matches its desired configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceStatus {
    /// Current state already satisfies the desired configuration
    Compliant,
    /// A mutation is required to reach the desired configuration
    NeedsMutation,
}

impl ComplianceStatus {
    /// Derive the status from an inspection result.
    ///
    /// A failed inspection counts as non-compliant so the target is attempted
    /// rather than silently skipped.
    pub fn from_inspection<E>(result: &Result<bool, E>) -> Self {
        match result {
            Ok(true) => Self::Compliant,
            Ok(false) | Err(_) => Self::NeedsMutation,
        }
    }
}

/// How a mutation failure should be classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The remote side reports the change is already in place
    Conflict,
    /// Any other failure (transport, parse, validation, permission)
    Rejected,
}

/// Error returned by a target's mutation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApplyError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApplyError {
    /// A conflict: the desired state was applied previously
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Conflict,
            message: message.into(),
        }
    }

    /// A genuine failure
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            message: message.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == FailureKind::Conflict
    }
}

/// Result of attempting a mutation on one pending target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutationOutcome {
    /// Mutation succeeded
    Created,
    /// Remote side reported the mutation as already applied
    AlreadyExists,
    /// Mutation failed; reason is truncated for display
    Failed { reason: String },
}

impl MutationOutcome {
    /// Classify the result of a single mutation call
    pub fn classify(result: Result<(), ApplyError>) -> Self {
        match result {
            Ok(()) => Self::Created,
            Err(e) if e.is_conflict() => Self::AlreadyExists,
            Err(e) => Self::Failed {
                reason: truncate_reason(&e.message),
            },
        }
    }

    /// Whether the target ends up in the desired state
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Trim whitespace and cap a failure message at [`MAX_REASON_LEN`] characters
pub fn truncate_reason(message: &str) -> String {
    message.trim().chars().take(MAX_REASON_LEN).collect()
}

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub compliant: usize,
    pub created: usize,
    pub already_exists: usize,
    pub failed: usize,
    /// Target id and reason for every failure, in execution order
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    /// Tally outcomes on top of the number of already-compliant targets
    pub fn from_outcomes(compliant: usize, outcomes: &[(String, MutationOutcome)]) -> Self {
        let mut summary = Self {
            compliant,
            ..Self::default()
        };
        for (id, outcome) in outcomes {
            summary.add_outcome(id, outcome);
        }
        summary
    }

    /// Add a single outcome to the summary
    pub fn add_outcome(&mut self, id: &str, outcome: &MutationOutcome) {
        match outcome {
            MutationOutcome::Created => self.created += 1,
            MutationOutcome::AlreadyExists => self.already_exists += 1,
            MutationOutcome::Failed { reason } => {
                self.failed += 1;
                self.failures.push((id.to_string(), reason.clone()));
            }
        }
    }

    /// Number of targets that needed a mutation
    pub fn attempted(&self) -> usize {
        self.created + self.already_exists + self.failed
    }

    /// Number of targets enumerated in the run
    pub fn total(&self) -> usize {
        self.compliant + self.attempted()
    }

    /// Targets in the desired state once the run is over
    pub fn now_compliant(&self) -> usize {
        self.compliant + self.created + self.already_exists
    }

    /// Check if no mutation failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Terminal state of a reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Every target was compliant; nothing was prompted or applied
    NothingToDo { compliant: usize },
    /// The operator declined; nothing was applied
    Declined { compliant: usize, pending: usize },
    /// Mutations were attempted
    Applied {
        summary: RunSummary,
        outcomes: Vec<(String, MutationOutcome)>,
    },
}

impl RunReport {
    /// Whether any mutation was attempted
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
