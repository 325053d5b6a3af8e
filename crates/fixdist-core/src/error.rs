//! Error types for geographic values
//!
//! The distance kernel itself is total on valid points; the only failure in
//! this crate is building a point from bad input.

use std::fmt;
use thiserror::Error;

/// Which component of a coordinate was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Longitude, valid in [-180, 180]
    Longitude,
    /// Latitude, valid in [-90, 90]
    Latitude,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Longitude => write!(f, "longitude"),
            Axis::Latitude => write!(f, "latitude"),
        }
    }
}

/// Main error type for geographic values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Coordinate component out of range or not finite
    #[error("Invalid coordinate: {axis} {value} is out of range or not finite")]
    InvalidCoordinate {
        /// Offending component
        axis: Axis,
        /// Rejected value
        value: f64,
    },
}

impl GeoError {
    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            GeoError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
        }
    }
}

/// Result type alias for geographic operations
pub type Result<T> = std::result::Result<T, GeoError>;
