//! Configuration types for distance sessions
//!
//! A session needs a reference point to measure against. Everything else has
//! a default: the provider name, how long to wait for a fix, and the texts
//! handed to the presenter.

use fixdist_core::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{FailureKind, Result, SessionError};

/// Default reference longitude (degrees east)
pub const DEFAULT_REFERENCE_LONGITUDE: f64 = 8.4043;

/// Default reference latitude (degrees north)
pub const DEFAULT_REFERENCE_LATITUDE: f64 = 49.0140;

/// Default positioning provider
pub const DEFAULT_PROVIDER: &str = "gps";

/// Default limit on the wait for a fix
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(30);

/// Main configuration for a distance session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Point every fix is measured against
    #[serde(default = "default_reference")]
    pub reference: GeoPoint,

    /// Positioning provider requested from the host
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Limit on the wait for a fix (`None` waits indefinitely)
    #[serde(with = "optional_duration", default = "default_fix_timeout")]
    pub fix_timeout: Option<Duration>,

    /// Texts shown through the presenter
    #[serde(default)]
    pub messages: Messages,
}

fn default_reference() -> GeoPoint {
    GeoPoint::new(DEFAULT_REFERENCE_LONGITUDE, DEFAULT_REFERENCE_LATITUDE)
        .expect("default reference is a valid coordinate")
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_fix_timeout() -> Option<Duration> {
    Some(DEFAULT_FIX_TIMEOUT)
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            provider: default_provider(),
            fix_timeout: default_fix_timeout(),
            messages: Messages::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "provider must not be empty".to_string(),
            ));
        }
        if self.fix_timeout == Some(Duration::ZERO) {
            return Err(SessionError::InvalidConfig(
                "fix_timeout must be positive; use null to disable it".to_string(),
            ));
        }
        Ok(())
    }
}

/// Titles and messages handed to the presenter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// Title of the result dialog
    pub result_title: String,
    /// Title of every error dialog
    pub error_title: String,
    /// Text before the kilometre count
    pub result_prefix: String,
    /// Location permission refused
    pub permission_denied: String,
    /// Any internal inconsistency
    pub internal_error: String,
    /// No positioning provider
    pub provider_unavailable: String,
    /// No fix in time
    pub timeout: String,
    /// Cancelled by the user
    pub cancelled: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            result_title: "Result".to_string(),
            error_title: "Error".to_string(),
            result_prefix: "Distance to home: ".to_string(),
            permission_denied: "Location permission was denied.".to_string(),
            internal_error: "Internal error while checking the location permission."
                .to_string(),
            provider_unavailable: "No location service available.".to_string(),
            timeout: "No position fix received in time.".to_string(),
            cancelled: "Location request cancelled.".to_string(),
        }
    }
}

impl Messages {
    /// Result text for a distance in whole kilometres
    pub fn result(&self, km: u64) -> String {
        format!("{}{} km", self.result_prefix, km)
    }

    /// Error text for a failure kind
    pub fn failure(&self, kind: FailureKind) -> &str {
        match kind {
            FailureKind::PermissionDenied => &self.permission_denied,
            FailureKind::ProviderUnavailable => &self.provider_unavailable,
            FailureKind::Timeout => &self.timeout,
            FailureKind::Cancelled => &self.cancelled,
            FailureKind::InternalInconsistency => &self.internal_error,
        }
    }
}

/// Builder for SessionConfig
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reference point
    pub fn reference(mut self, reference: GeoPoint) -> Self {
        self.config.reference = reference;
        self
    }

    /// Set the reference point from degrees
    pub fn reference_degrees(mut self, longitude: f64, latitude: f64) -> Result<Self> {
        self.config.reference = GeoPoint::new(longitude, latitude)?;
        Ok(self)
    }

    /// Set the positioning provider
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.config.provider = provider.into();
        self
    }

    /// Set or disable the fix timeout
    pub fn fix_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.fix_timeout = timeout;
        self
    }

    /// Replace the presenter texts
    pub fn messages(mut self, messages: Messages) -> Self {
        self.config.messages = messages;
        self
    }

    /// Build the configuration
    pub fn build(self) -> SessionConfig {
        self.config
    }
}

// Optional Duration as a humantime string, or null
mod optional_duration {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        s.map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
