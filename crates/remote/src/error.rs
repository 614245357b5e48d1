//! Error types for remote calls.
//!
//! Every failure is returned as a discriminated [`Error`]; callers classify
//! it through [`Error::category`] instead of reading the message text.

use std::fmt;
use std::io;

/// Result type alias for remote calls.
pub type Result<T> = std::result::Result<T, Error>;

/// Substrings that platforms use to report an already-applied mutation.
const IDEMPOTENCY_MARKERS: &[&str] = &["already exists"];

/// Categories of remote errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network failure or the CLI could not be launched.
    Transport,
    /// Response body was not valid JSON or had an unexpected shape.
    Parse,
    /// The mutation was already applied (idempotent no-op).
    Conflict,
    /// Validation, permission or any other platform-reported failure.
    Rejected,
}

impl ErrorCategory {
    /// Whether this error can be safely ignored (operation already done).
    #[must_use]
    pub fn is_ignorable(&self) -> bool {
        matches!(self, Self::Conflict)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Transport => "Could not reach the platform",
            Self::Parse => "Unexpected response format",
            Self::Conflict => "Already exists",
            Self::Rejected => "Rejected by the platform",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur during a remote call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network error or process launch failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response could not be parsed.
    #[error("invalid response: {0}")]
    Parse(String),

    /// The platform answered with a failure.
    #[error("{message}")]
    Api {
        /// HTTP status code if known.
        status: Option<u16>,
        /// Raw message reported by the platform.
        message: String,
    },

    /// The request cannot be expressed by this client.
    #[error("unsupported request: {0}")]
    Unsupported(String),
}

impl Error {
    /// Create an API error.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status code, when the platform reported one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Parse(_) => ErrorCategory::Parse,
            Self::Api { status: Some(409), .. } => ErrorCategory::Conflict,
            Self::Api { message, .. } if is_idempotency_marker(message) => {
                ErrorCategory::Conflict
            }
            Self::Api { .. } | Self::Unsupported(_) => ErrorCategory::Rejected,
        }
    }

    /// Whether the failure means the mutation is already in place.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }
}

/// Compatibility shim: detect "already exists" style messages.
///
/// Platforms do not always return a dedicated status for duplicates
/// (GitHub answers 422 for an existing hook), so the message is checked
/// case-insensitively.
pub fn is_idempotency_marker(message: &str) -> bool {
    let lower = message.to_lowercase();
    IDEMPOTENCY_MARKERS.iter().any(|m| lower.contains(m))
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::api(Some(code), format!("HTTP {code}")),
            other => Self::Transport(other.to_string()),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_exists_is_conflict() {
        let err = Error::api(Some(422), "Hook already exists on this repository");
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert!(err.is_conflict());
    }

    #[test]
    fn test_marker_is_case_insensitive() {
        assert!(is_idempotency_marker("Application ALREADY EXISTS"));
        assert!(!is_idempotency_marker("Validation Failed"));
    }

    #[test]
    fn test_409_is_conflict_without_marker() {
        let err = Error::api(Some(409), "duplicate");
        assert_eq!(err.category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_other_api_errors_are_rejected() {
        let err = Error::api(Some(403), "Resource not accessible by integration");
        assert_eq!(err.category(), ErrorCategory::Rejected);
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn test_transport_and_parse_categories() {
        assert_eq!(
            Error::Transport("gh not found".into()).category(),
            ErrorCategory::Transport
        );
        assert_eq!(
            Error::Parse("expected value".into()).category(),
            ErrorCategory::Parse
        );
        assert_eq!(
            Error::Unsupported("cli".into()).category(),
            ErrorCategory::Rejected
        );
    }

    #[test]
    fn test_marker_only_applies_to_api_errors() {
        // A transport failure mentioning the marker is still a transport failure
        let err = Error::Transport("socket already exists".into());
        assert_eq!(err.category(), ErrorCategory::Transport);
    }

    #[test]
    fn test_category_ignorable() {
        assert!(ErrorCategory::Conflict.is_ignorable());
        assert!(!ErrorCategory::Rejected.is_ignorable());
        assert!(!ErrorCategory::Transport.is_ignorable());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Parse);
    }
}
