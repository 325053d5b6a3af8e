//! WGS-84 ellipsoid parameters

/// Semi-major axis in metres (equatorial radius)
pub const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;

/// Flattening of the ellipsoid
pub const FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Semi-minor axis in metres (polar radius)
pub const SEMI_MINOR_AXIS: f64 = SEMI_MAJOR_AXIS * (1.0 - FLATTENING);

/// Mean Earth radius used by the spherical fallback
pub const MEAN_RADIUS: f64 = 6_371_009.0;

/// Latitude beyond which a point is treated as sitting on the pole
pub const POLE_LATITUDE_DEG: f64 = 89.999_999;
