//! Geographic point type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{Axis, GeoError, Result};

/// A validated WGS-84 position in decimal degrees
///
/// Longitude lies in [-180, 180] and latitude in [-90, 90]; both are finite.
/// Two points are equal when their components are bit-equal, with longitude
/// -180 treated as +180.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    longitude: f64,
    latitude: f64,
}

/// Unvalidated wire form of [`GeoPoint`]
#[derive(Deserialize)]
struct RawGeoPoint {
    longitude: f64,
    latitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self> {
        GeoPoint::new(raw.longitude, raw.latitude)
    }
}

impl GeoPoint {
    /// Create a point from longitude and latitude in decimal degrees
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidCoordinate {
                axis: Axis::Longitude,
                value: longitude,
            });
        }
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidCoordinate {
                axis: Axis::Latitude,
                value: latitude,
            });
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Longitude in degrees, positive east
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees, positive north
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// The point on the opposite side of the Earth
    pub fn antipode(&self) -> Self {
        let longitude = if self.longitude <= 0.0 {
            self.longitude + 180.0
        } else {
            self.longitude - 180.0
        };
        Self {
            longitude,
            latitude: -self.latitude,
        }
    }

    fn key(&self) -> (u64, u64) {
        let longitude = if self.longitude == -180.0 {
            180.0
        } else {
            self.longitude
        };
        (longitude.to_bits(), self.latitude.to_bits())
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

// Components are finite by construction, so bit equality is an equivalence.
impl Eq for GeoPoint {}

impl Hash for GeoPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.longitude, self.latitude)
    }
}
