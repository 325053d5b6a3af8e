//! Error types for distance sessions
//!
//! Every failure ends the session; nothing is retried inside the façade.
//! [`FailureKind`] is the copyable tag kept in
//! [`SessionState::Failed`](crate::state::SessionState::Failed).

use fixdist_core::GeoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::permission::PermissionInconsistency;
use crate::state::SessionState;

/// Why a session ended in the Failed state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The host refused location access
    PermissionDenied,
    /// No positioning provider is available
    ProviderUnavailable,
    /// No fix arrived in time
    Timeout,
    /// The caller cancelled the session
    Cancelled,
    /// The permission response did not match the request
    InternalInconsistency,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::PermissionDenied => write!(f, "permission denied"),
            FailureKind::ProviderUnavailable => write!(f, "provider unavailable"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Cancelled => write!(f, "cancelled"),
            FailureKind::InternalInconsistency => write!(f, "internal inconsistency"),
        }
    }
}

/// Main error type for distance sessions
#[derive(Error, Debug)]
pub enum SessionError {
    // ===== Session Flow Errors =====
    /// A session is already in progress
    #[error("A distance session is already running")]
    AlreadyRunning,

    /// Location permission refused
    #[error("Location permission denied")]
    PermissionDenied,

    /// The host has no usable provider
    #[error("Position provider unavailable: {provider}")]
    ProviderUnavailable {
        /// Requested provider name
        provider: String,
    },

    /// Position source gave up or the configured limit elapsed
    #[error("Timed out waiting for a position fix")]
    Timeout,

    /// Cancelled by the caller
    #[error("Session cancelled")]
    Cancelled,

    /// Permission response did not match the request
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(#[from] PermissionInconsistency),

    /// Operation not allowed in the current state
    #[error("Invalid session state transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current state
        from: SessionState,
        /// Requested state
        to: SessionState,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid coordinate in configuration or input
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// The terminal state tag for errors that end a running session
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            SessionError::PermissionDenied => Some(FailureKind::PermissionDenied),
            SessionError::ProviderUnavailable { .. } => Some(FailureKind::ProviderUnavailable),
            SessionError::Timeout => Some(FailureKind::Timeout),
            SessionError::Cancelled => Some(FailureKind::Cancelled),
            SessionError::InternalInconsistency(_) => Some(FailureKind::InternalInconsistency),
            _ => None,
        }
    }

    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionError::AlreadyRunning => "ALREADY_RUNNING",
            SessionError::PermissionDenied => "PERMISSION_DENIED",
            SessionError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            SessionError::Timeout => "TIMEOUT",
            SessionError::Cancelled => "CANCELLED",
            SessionError::InternalInconsistency(_) => "INTERNAL_INCONSISTENCY",
            SessionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SessionError::InvalidConfig(_) => "INVALID_CONFIG",
            SessionError::Geo(_) => "INVALID_COORDINATE",
            SessionError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::InvalidConfig(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(SessionError::AlreadyRunning.error_code(), "ALREADY_RUNNING");
        assert_eq!(SessionError::Timeout.error_code(), "TIMEOUT");
    }

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            SessionError::PermissionDenied.failure_kind(),
            Some(FailureKind::PermissionDenied)
        );
        assert_eq!(
            SessionError::InternalInconsistency(PermissionInconsistency::MissingGrant)
                .failure_kind(),
            Some(FailureKind::InternalInconsistency)
        );
        assert_eq!(SessionError::AlreadyRunning.failure_kind(), None);
        assert_eq!(
            SessionError::InvalidConfig("x".to_string()).failure_kind(),
            None
        );
    }

    #[test]
    fn test_provider_in_message() {
        let err = SessionError::ProviderUnavailable {
            provider: "gps".to_string(),
        };
        assert!(err.to_string().contains("gps"));
    }
}
