//! Caller-facing error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-checkable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed, empty or oversized input. Fix and resend.
    ValidationError,
    /// Unknown session.
    NotFound,
    /// A real prompt already has a response.
    Conflict,
    /// A bounded wait elapsed. Retry the wait.
    ///
    /// The relay itself never fails with this kind: an elapsed long-poll is
    /// an empty result. Clients report it when a pushed response is late.
    Timeout,
}

impl ErrorKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Timeout => "timeout",
        }
    }
}

/// Relay error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("Missing required field: {field} cannot be empty")]
    MissingField { field: &'static str },
    #[error("Message exceeds size limit: {field} exceeds {limit} bytes")]
    TooLarge { field: &'static str, limit: usize },
    #[error("Invalid {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Response already exists for client_msg_id: {0}")]
    Conflict(String),
}

impl RelayError {
    /// Kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField { .. }
            | Self::TooLarge { .. }
            | Self::OutOfRange { .. }
            | Self::InvalidRequest(_) => ErrorKind::ValidationError,
            Self::SessionNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
        }
    }

    /// Short human-readable summary, without the offending value.
    #[must_use]
    pub const fn summary(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "Missing required field",
            Self::TooLarge { .. } => "Message exceeds size limit",
            Self::OutOfRange { .. } | Self::InvalidRequest(_) => "Invalid request",
            Self::SessionNotFound(_) => "Session not found",
            Self::Conflict(_) => "Response already exists for client_msg_id",
        }
    }

    /// Detail string: the offending field name or value.
    #[must_use]
    pub fn details(&self) -> String {
        match self {
            Self::MissingField { field } => format!("{field} cannot be empty"),
            Self::TooLarge { field, limit } => format!("{field} exceeds {limit} bytes"),
            Self::OutOfRange { field, reason } => format!("{field} {reason}"),
            Self::InvalidRequest(reason) => reason.clone(),
            Self::SessionNotFound(id) | Self::Conflict(id) => id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            RelayError::MissingField { field: "prompt" }.kind(),
            ErrorKind::ValidationError
        );
        assert_eq!(
            RelayError::SessionNotFound("s".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(RelayError::Conflict("c".into()).kind(), ErrorKind::Conflict);
        assert_eq!(ErrorKind::ValidationError.as_str(), "validation_error");
    }

    #[test]
    fn test_relay_never_times_out() {
        let errors = [
            RelayError::MissingField { field: "prompt" },
            RelayError::TooLarge {
                field: "text",
                limit: 1,
            },
            RelayError::OutOfRange {
                field: "timeout",
                reason: "must be at most 300".into(),
            },
            RelayError::InvalidRequest("bad".into()),
            RelayError::SessionNotFound("s".into()),
            RelayError::Conflict("c".into()),
        ];
        for err in errors {
            assert_ne!(err.kind(), ErrorKind::Timeout, "{err}");
        }
        assert_eq!(ErrorKind::Timeout.as_str(), "timeout");
    }

    #[test]
    fn test_details_name_the_field() {
        let err = RelayError::TooLarge {
            field: "text",
            limit: 131_072,
        };
        assert_eq!(err.summary(), "Message exceeds size limit");
        assert_eq!(err.details(), "text exceeds 131072 bytes");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"not_found\"");
    }
}
