//! fixdist Core - Geographic points and the geodesic distance kernel
//!
//! This crate holds the only numerical part of fixdist: validated WGS-84
//! points and an inverse geodesic solver that measures the distance between
//! them.
//!
//! # Modules
//!
//! - [`point`] - Validated longitude/latitude pairs
//! - [`vincenty`] - Vincenty inverse solution with great-circle fallback
//! - [`distance`] - Distance results and solution methods
//! - [`wgs84`] - Ellipsoid parameters
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```rust
//! use fixdist_core::{distance, GeoPoint};
//!
//! let karlsruhe = GeoPoint::new(8.4043, 49.0140).unwrap();
//! let berlin = GeoPoint::new(13.4050, 52.5200).unwrap();
//!
//! let result = distance(&berlin, &karlsruhe);
//! assert_eq!(result.whole_kilometres(), 525);
//! ```

pub mod distance;
pub mod error;
pub mod point;
pub mod vincenty;
pub mod wgs84;

// Re-exports for convenience
pub use distance::{DistanceMethod, DistanceResult};
pub use error::{Axis, GeoError, Result};
pub use point::GeoPoint;
pub use vincenty::{distance, great_circle};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
