//! Distance results produced by the geodesic kernel

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a [`DistanceResult`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMethod {
    /// Converged Vincenty inverse solution on the ellipsoid
    Vincenty,
    /// Both points are the same location
    Coincident,
    /// Exact antipodes, resolved as half a meridian
    Antipodal,
    /// Spherical approximation after Vincenty failed to converge
    GreatCircle,
}

impl fmt::Display for DistanceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMethod::Vincenty => write!(f, "vincenty"),
            DistanceMethod::Coincident => write!(f, "coincident"),
            DistanceMethod::Antipodal => write!(f, "antipodal"),
            DistanceMethod::GreatCircle => write!(f, "great-circle"),
        }
    }
}

/// Distance and azimuths between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    /// Surface distance in metres, finite and non-negative
    pub metres: f64,
    /// Azimuth at the first point in degrees clockwise from true north, in [0, 360)
    pub initial_bearing: f64,
    /// Azimuth on arrival at the second point, in [0, 360)
    pub final_bearing: f64,
    /// Solution method
    pub method: DistanceMethod,
    /// Number of Vincenty iterations performed
    pub iterations: u32,
}

impl DistanceResult {
    pub(crate) fn zero() -> Self {
        Self {
            metres: 0.0,
            initial_bearing: 0.0,
            final_bearing: 0.0,
            method: DistanceMethod::Coincident,
            iterations: 0,
        }
    }

    /// Whether the distance came from the spherical fallback
    pub fn is_approximate(&self) -> bool {
        self.method == DistanceMethod::GreatCircle
    }

    /// Distance in kilometres, truncated toward zero
    pub fn whole_kilometres(&self) -> u64 {
        (self.metres / 1000.0).floor() as u64
    }
}

/// Normalize an angle in degrees into [0, 360)
pub(crate) fn normalize_bearing(degrees: f64) -> f64 {
    let b = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if b >= 360.0 {
        0.0
    } else {
        b
    }
}
