//! Host collaborators of a distance session
//!
//! The session never talks to a platform directly. The host supplies:
//!
//! - a [`PermissionGate`] that asks the user for location access
//! - a [`PositionSource`] that delivers exactly one fix per request
//! - a [`Presenter`] that shows the outcome
//!
//! The gate and the source may suspend; the presenter is called synchronously.

use async_trait::async_trait;
use fixdist_core::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::permission::{PermissionRequest, PermissionResponse};
use crate::state::SessionState;

/// Asks the host for permission to read the location
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Whether the permission is already held, so no request is needed
    async fn is_granted(&self) -> bool {
        false
    }

    /// Ask the user; resolves with the host's answer
    async fn request(&self, request: &PermissionRequest) -> PermissionResponse;
}

/// Result of a single-fix request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "position", rename_all = "snake_case")]
pub enum FixOutcome {
    /// A current position
    Fix(GeoPoint),
    /// The host has no such provider
    ProviderUnavailable,
    /// The host gave up waiting
    Timeout,
    /// The host cancelled the request
    Cancelled,
}

/// Delivers one current position
///
/// Each `request_single` call holds a host subscription until the session
/// calls [`release`](PositionSource::release). Release is called exactly once
/// per request, whether the request completed, failed or was abandoned.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Request exactly one fix from `provider`
    async fn request_single(&self, provider: &str) -> FixOutcome;

    /// Drop the subscription for `provider`; pending deliveries are abandoned
    fn release(&self, _provider: &str) {}

    /// Source name (for logging)
    fn name(&self) -> &str;
}

/// Shows session outcomes to the user
pub trait Presenter: Send + Sync {
    /// Show one outcome; called once per finished session
    fn show(&self, title: &str, message: &str, is_error: bool);

    /// Observe a state change, e.g. to toggle a progress indicator
    fn state_changed(&self, _state: &SessionState) {}
}

/// Provider status notifications from the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProviderEvent {
    /// Provider status code changed
    StatusChanged {
        /// Provider name
        provider: String,
        /// Host status code
        status: i32,
    },
    /// Provider switched on
    Enabled {
        /// Provider name
        provider: String,
    },
    /// Provider switched off
    Disabled {
        /// Provider name
        provider: String,
    },
}

impl fmt::Display for ProviderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderEvent::StatusChanged { provider, status } => {
                write!(f, "provider {} status {}", provider, status)
            }
            ProviderEvent::Enabled { provider } => write!(f, "provider {} enabled", provider),
            ProviderEvent::Disabled { provider } => write!(f, "provider {} disabled", provider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_event_display() {
        let event = ProviderEvent::Disabled {
            provider: "gps".to_string(),
        };
        assert_eq!(event.to_string(), "provider gps disabled");

        let event = ProviderEvent::StatusChanged {
            provider: "gps".to_string(),
            status: 2,
        };
        assert_eq!(event.to_string(), "provider gps status 2");
    }

    #[test]
    fn test_fix_outcome_json() {
        let fix = FixOutcome::Fix(GeoPoint::new(8.42, 49.014).unwrap());
        let json = serde_json::to_string(&fix).unwrap();
        assert!(json.contains("\"outcome\":\"fix\""));

        let timeout: FixOutcome = serde_json::from_str(r#"{"outcome":"timeout"}"#).unwrap();
        assert_eq!(timeout, FixOutcome::Timeout);
    }
}
