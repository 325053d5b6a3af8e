//! fixdist Session - one-shot "how far am I from home" flow
//!
//! This crate drives a single request from a user gesture to a displayed
//! distance. The host platform stays behind three traits; the session owns
//! the state machine and the rules around it.
//!
//! # Flow
//!
//! 1. A gesture starts the session (`Idle → AwaitingFix`)
//! 2. [`PermissionGate`] is asked for fine location access
//! 3. [`PositionSource`] delivers exactly one fix, bounded by `fix_timeout`
//! 4. The fix is measured against the configured reference point
//! 5. [`Presenter`] shows the distance in whole kilometres, or one error
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use fixdist_session::{DistanceSession, SessionConfigBuilder};
//!
//! let config = SessionConfigBuilder::new()
//!     .reference_degrees(8.4043, 49.0140)?
//!     .build();
//!
//! let session = DistanceSession::new(config, gate, source, presenter);
//! let report = session.gesture().await?;
//! println!("{} km from home", report.displayed_km);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod collaborator;
pub mod config;
pub mod error;
pub mod permission;
pub mod session;
pub mod state;

// Testing utilities
pub mod test_utils;

// Re-exports for convenience
pub use collaborator::{FixOutcome, PermissionGate, PositionSource, Presenter, ProviderEvent};
pub use config::{
    Messages, SessionConfig, SessionConfigBuilder, DEFAULT_FIX_TIMEOUT, DEFAULT_PROVIDER,
    DEFAULT_REFERENCE_LATITUDE, DEFAULT_REFERENCE_LONGITUDE,
};
pub use error::{FailureKind, Result, SessionError};
pub use permission::{
    PermissionGrant, PermissionInconsistency, PermissionRequest, PermissionResponse,
    FINE_LOCATION_PERMISSION, LOCATION_REQUEST_CODE,
};
pub use session::{DistanceReport, DistanceSession, SessionHandle};
pub use state::SessionState;

pub use test_utils::{RecordingPresenter, ScriptedPermissionGate, ScriptedPositionSource, Shown};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
