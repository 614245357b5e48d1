//! Glue between the remote clients and the reconcile engine
//!
//! - `gate`: interactive confirmation before any mutation
//! - `report`: per-target progress lines and the final tally

pub mod gate;
pub mod report;

pub use gate::InteractiveGate;
pub use report::{ConsoleProgress, print_report};

use reconcile::ApplyError;
use remote::ErrorCategory;

/// Map a classified remote failure onto the executor's failure kind
pub fn failure_to_apply_error(err: &remote::Error) -> ApplyError {
    match err.category() {
        ErrorCategory::Conflict => ApplyError::conflict(err.to_string()),
        _ => ApplyError::rejected(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reconcile::FailureKind;

    #[test]
    fn test_conflict_status_maps_to_conflict() {
        let err = remote::Error::api(Some(409), "duplicate");
        assert_eq!(failure_to_apply_error(&err).kind, FailureKind::Conflict);
    }

    #[test]
    fn test_marker_maps_to_conflict() {
        let err = remote::Error::api(Some(422), "Hook already exists on this repository");
        assert!(failure_to_apply_error(&err).is_conflict());
    }

    #[test]
    fn test_other_failures_are_rejections() {
        let cases = [
            remote::Error::api(Some(403), "Resource not accessible by integration"),
            remote::Error::Transport("connection reset".to_string()),
            remote::Error::Parse("expected value at line 1".to_string()),
        ];
        for err in &cases {
            assert_eq!(failure_to_apply_error(err).kind, FailureKind::Rejected);
        }
    }
}
