//! Vincenty inverse solution on the WGS-84 ellipsoid
//!
//! [`distance`] solves the inverse geodesic problem: given two points, find
//! the length of the shortest path between them on the ellipsoid together
//! with the azimuths at both ends. The solution iterates on λ, the longitude
//! difference on the auxiliary sphere, until it moves less than 1e-12 rad.
//!
//! Two configurations are resolved before iterating:
//!
//! - coincident points return zero
//! - exact antipodes return half a meridian, since every meridian through
//!   the poles is a shortest path between them
//!
//! Near-antipodal pairs where the iteration does not settle within
//! [`MAX_ITERATIONS`] (or λ leaves [-π, π]) fall back to a great circle on
//! a sphere of radius [`MEAN_RADIUS`](crate::wgs84::MEAN_RADIUS). The result
//! is then marked [`DistanceMethod::GreatCircle`].

use std::f64::consts::PI;
use tracing::debug;

use crate::distance::{normalize_bearing, DistanceMethod, DistanceResult};
use crate::point::GeoPoint;
use crate::wgs84::{FLATTENING, MEAN_RADIUS, POLE_LATITUDE_DEG, SEMI_MAJOR_AXIS, SEMI_MINOR_AXIS};

/// Iteration stops once λ moves less than this (radians)
pub const CONVERGENCE_THRESHOLD: f64 = 1e-12;

/// Hard cap on λ iterations
pub const MAX_ITERATIONS: u32 = 200;

/// Points closer than this in both latitude and longitude (radians) are the same point
const COINCIDENT_TOLERANCE: f64 = 1e-12;

/// sin σ below this with cos σ < 0 means the points are antipodal
const ANTIPODAL_TOLERANCE: f64 = 1e-9;

/// Compute the geodesic distance and azimuths from `a` to `b`
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> DistanceResult {
    let (lon1, lat1) = polar_adjusted(a);
    let (lon2, lat2) = polar_adjusted(b);

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let l = wrap_longitude((lon2 - lon1).to_radians());

    if (phi2 - phi1).abs() < COINCIDENT_TOLERANCE && l.abs() < COINCIDENT_TOLERANCE {
        return DistanceResult::zero();
    }

    let u1 = ((1.0 - FLATTENING) * phi1.tan()).atan();
    let u2 = ((1.0 - FLATTENING) * phi2.tan()).atan();
    let aux = AuxiliarySphere {
        sin_u1: u1.sin(),
        cos_u1: u1.cos(),
        sin_u2: u2.sin(),
        cos_u2: u2.cos(),
    };

    match iterate(&aux, l) {
        Iteration::Converged(state) => state.solve(&aux),
        Iteration::Coincident(iterations) => DistanceResult {
            iterations,
            ..DistanceResult::zero()
        },
        Iteration::Antipodal(iterations) => DistanceResult {
            metres: half_meridian(),
            initial_bearing: 0.0,
            final_bearing: 180.0,
            method: DistanceMethod::Antipodal,
            iterations,
        },
        Iteration::Diverged(iterations) => {
            debug!(
                "Vincenty did not converge after {} iterations for {} -> {}, using great circle",
                iterations, a, b
            );
            DistanceResult {
                iterations,
                ..great_circle(a, b)
            }
        }
    }
}

/// Great-circle distance on a sphere of mean Earth radius
///
/// Uses the haversine form, which stays well conditioned for short distances.
pub fn great_circle(a: &GeoPoint, b: &GeoPoint) -> DistanceResult {
    let phi1 = a.latitude().to_radians();
    let phi2 = b.latitude().to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = wrap_longitude((b.longitude() - a.longitude()).to_radians());

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let central_angle = 2.0 * h.sqrt().min(1.0).asin();

    let initial = spherical_bearing(phi1, phi2, d_lambda);
    let reverse = spherical_bearing(phi2, phi1, -d_lambda);

    DistanceResult {
        metres: MEAN_RADIUS * central_angle,
        initial_bearing: normalize_bearing(initial.to_degrees()),
        final_bearing: normalize_bearing(reverse.to_degrees() + 180.0),
        method: DistanceMethod::GreatCircle,
        iterations: 0,
    }
}

/// Distance between antipodes: half the meridian ellipse
pub fn half_meridian() -> f64 {
    SEMI_MINOR_AXIS * series_a(second_eccentricity_sq()) * PI
}

struct AuxiliarySphere {
    sin_u1: f64,
    cos_u1: f64,
    sin_u2: f64,
    cos_u2: f64,
}

/// Quantities from the last λ iteration, needed for the distance series
struct Converged {
    lambda: f64,
    sin_sigma: f64,
    cos_sigma: f64,
    sigma: f64,
    cos_sq_alpha: f64,
    cos_2sigma_m: f64,
    iterations: u32,
}

enum Iteration {
    Converged(Converged),
    Coincident(u32),
    Antipodal(u32),
    Diverged(u32),
}

fn iterate(aux: &AuxiliarySphere, l: f64) -> Iteration {
    let AuxiliarySphere {
        sin_u1,
        cos_u1,
        sin_u2,
        cos_u2,
    } = *aux;

    let mut lambda = l;
    let mut previous_step = f64::INFINITY;
    let mut damped = false;

    for iteration in 1..=MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let sin_sigma =
            (cos_u2 * sin_lambda).hypot(cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda);
        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;

        if sin_sigma < ANTIPODAL_TOLERANCE && cos_sigma < 0.0 {
            return Iteration::Antipodal(iteration);
        }
        if sin_sigma == 0.0 {
            return Iteration::Coincident(iteration);
        }

        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        // Equatorial lines have cos²α = 0
        let cos_2sigma_m = if cos_sq_alpha != 0.0 {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        } else {
            0.0
        };
        let c = FLATTENING / 16.0 * cos_sq_alpha * (4.0 + FLATTENING * (4.0 - 3.0 * cos_sq_alpha));

        let target = l
            + (1.0 - c)
                * FLATTENING
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        let step = target - lambda;
        if step.abs() >= previous_step {
            damped = true;
        }
        previous_step = step.abs();

        let next = if damped { lambda + 0.5 * step } else { target };
        if !next.is_finite() || next.abs() > PI {
            return Iteration::Diverged(iteration);
        }

        let delta = (next - lambda).abs();
        lambda = next;

        if delta < CONVERGENCE_THRESHOLD {
            return Iteration::Converged(Converged {
                lambda,
                sin_sigma,
                cos_sigma,
                sigma,
                cos_sq_alpha,
                cos_2sigma_m,
                iterations: iteration,
            });
        }
    }

    Iteration::Diverged(MAX_ITERATIONS)
}

impl Converged {
    fn solve(&self, aux: &AuxiliarySphere) -> DistanceResult {
        let u_sq = self.cos_sq_alpha * second_eccentricity_sq();
        let big_a = series_a(u_sq);
        let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

        let cos_2sigma_m_sq = self.cos_2sigma_m * self.cos_2sigma_m;
        let delta_sigma = big_b
            * self.sin_sigma
            * (self.cos_2sigma_m
                + big_b / 4.0
                    * (self.cos_sigma * (-1.0 + 2.0 * cos_2sigma_m_sq)
                        - big_b / 6.0
                            * self.cos_2sigma_m
                            * (-3.0 + 4.0 * self.sin_sigma * self.sin_sigma)
                            * (-3.0 + 4.0 * cos_2sigma_m_sq)));

        let metres = (SEMI_MINOR_AXIS * big_a * (self.sigma - delta_sigma)).max(0.0);

        let (sin_lambda, cos_lambda) = self.lambda.sin_cos();
        let initial = (aux.cos_u2 * sin_lambda)
            .atan2(aux.cos_u1 * aux.sin_u2 - aux.sin_u1 * aux.cos_u2 * cos_lambda);
        let fin = (aux.cos_u1 * sin_lambda)
            .atan2(-aux.sin_u1 * aux.cos_u2 + aux.cos_u1 * aux.sin_u2 * cos_lambda);

        DistanceResult {
            metres,
            initial_bearing: normalize_bearing(initial.to_degrees()),
            final_bearing: normalize_bearing(fin.to_degrees()),
            method: DistanceMethod::Vincenty,
            iterations: self.iterations,
        }
    }
}

/// (a² − b²) / b²
fn second_eccentricity_sq() -> f64 {
    (SEMI_MAJOR_AXIS * SEMI_MAJOR_AXIS - SEMI_MINOR_AXIS * SEMI_MINOR_AXIS)
        / (SEMI_MINOR_AXIS * SEMI_MINOR_AXIS)
}

fn series_a(u_sq: f64) -> f64 {
    1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)))
}

/// Longitude and latitude in degrees, with longitude pinned to 0 at the poles
fn polar_adjusted(p: &GeoPoint) -> (f64, f64) {
    if p.latitude().abs() > POLE_LATITUDE_DEG {
        (0.0, p.latitude())
    } else {
        (p.longitude(), p.latitude())
    }
}

/// Wrap a longitude difference into (-π, π]
fn wrap_longitude(radians: f64) -> f64 {
    if radians > PI {
        radians - 2.0 * PI
    } else if radians <= -PI {
        radians + 2.0 * PI
    } else {
        radians
    }
}

fn spherical_bearing(phi1: f64, phi2: f64, d_lambda: f64) -> f64 {
    (d_lambda.sin() * phi2.cos()).atan2(phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat).unwrap()
    }

    fn dms(d: f64, m: f64, s: f64) -> f64 {
        d + m / 60.0 + s / 3600.0
    }

    #[test]
    fn test_flinders_peak_to_buninyong() {
        // Classic test line from Vincenty's 1975 paper
        let flinders = point(dms(144.0, 25.0, 29.52440), -dms(37.0, 57.0, 3.72030));
        let buninyong = point(dms(143.0, 55.0, 35.38390), -dms(37.0, 39.0, 10.15610));

        let r = distance(&flinders, &buninyong);
        assert_eq!(r.method, DistanceMethod::Vincenty);
        assert!((r.metres - 54_972.271).abs() < 1e-3, "got {}", r.metres);
        assert!((r.initial_bearing - 306.868_159).abs() < 1e-5);
        assert!((r.final_bearing - 307.173_631).abs() < 1e-5);
    }

    #[test]
    fn test_quarter_equator() {
        let r = distance(&point(0.0, 0.0), &point(90.0, 0.0));
        assert!((r.metres - 10_018_754.171_4).abs() < 1e-3);
        assert!((r.initial_bearing - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_meridian() {
        let r = distance(&point(10.0, 0.0), &point(10.0, 90.0));
        assert!((r.metres - 10_001_965.729_3).abs() < 1e-3);
        assert!(r.initial_bearing.abs() < 1e-9);
    }

    #[test]
    fn test_identical_points() {
        let p = point(8.4043, 49.0140);
        let r = distance(&p, &p);
        assert_eq!(r.metres, 0.0);
        assert_eq!(r.initial_bearing, 0.0);
        assert_eq!(r.method, DistanceMethod::Coincident);
    }

    #[test]
    fn test_dateline_points_are_coincident() {
        let r = distance(&point(180.0, 20.0), &point(-180.0, 20.0));
        assert_eq!(r.metres, 0.0);
    }

    #[test]
    fn test_pole_longitude_ignored() {
        let a = point(0.0, 90.0);
        let b = point(135.0, 90.0);
        assert_eq!(distance(&a, &b).metres, 0.0);

        let c = point(45.0, 0.0);
        let from_a = distance(&a, &c).metres;
        let from_b = distance(&b, &c).metres;
        assert_eq!(from_a, from_b);
    }

    #[test]
    fn test_exact_antipodes() {
        let a = point(8.4043, 49.0140);
        let r = distance(&a, &a.antipode());
        assert_eq!(r.method, DistanceMethod::Antipodal);
        assert!((r.metres - 20_003_931.458_6).abs() < 1e-2);
        assert_eq!(r.initial_bearing, 0.0);
        assert_eq!(r.final_bearing, 180.0);
    }

    #[test]
    fn test_near_antipodal_converges() {
        let r = distance(&point(-171.0, -49.0), &point(8.4043, 49.0140));
        assert_eq!(r.method, DistanceMethod::Vincenty);
        assert!((r.metres - 19_974_766.418).abs() < 1e-2);
    }

    #[test]
    fn test_damped_iteration_converges() {
        // Undamped λ oscillates here and runs into the iteration cap
        let a = point(-17.77, -13.49);
        let b = point(161.66, 13.32);

        let r = distance(&a, &b);
        assert_eq!(r.method, DistanceMethod::Vincenty);
        assert!(r.iterations > 50, "only {} iterations", r.iterations);
        assert!(r.iterations < MAX_ITERATIONS);
        assert!((r.metres - 19_962_850.120_5).abs() < 1e-2, "got {}", r.metres);

        let back = distance(&b, &a);
        assert_eq!(back.method, DistanceMethod::Vincenty);
        assert!((back.metres - r.metres).abs() < 1e-6);
    }

    #[test]
    fn test_slow_convergence_near_antipode() {
        let a = point(-64.98228396608349, -7.592969998536361);
        let b = point(114.41570647031037, 7.971733181620531);

        let r = distance(&a, &b);
        assert_eq!(r.method, DistanceMethod::Vincenty);
        assert!(r.iterations > 100, "only {} iterations", r.iterations);
        assert!((r.metres - 19_942_371.359).abs() < 1e-2, "got {}", r.metres);
        assert!((distance(&b, &a).metres - r.metres).abs() < 1e-6);
    }

    #[test]
    fn test_non_convergence_falls_back() {
        // Equatorial, 0.1 degree short of antipodal: λ would have to exceed π
        let a = point(0.0, 0.0);
        let b = point(179.9, 0.0);
        let r = distance(&a, &b);
        assert_eq!(r.method, DistanceMethod::GreatCircle);
        assert!(r.is_approximate());
        let expected = great_circle(&a, &b).metres;
        assert_eq!(r.metres, expected);
        assert!(r.metres > 19_990_000.0 && r.metres < 20_015_200.0);
    }

    #[test]
    fn test_great_circle_quarter() {
        let r = great_circle(&point(0.0, 0.0), &point(90.0, 0.0));
        assert!((r.metres - 10_007_557.535).abs() < 1e-2);
        assert!((r.initial_bearing - 90.0).abs() < 1e-9);
        assert!((r.final_bearing - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrap_longitude() {
        assert_eq!(wrap_longitude(PI), PI);
        assert_eq!(wrap_longitude(-PI), PI);
        assert!((wrap_longitude(1.5 * PI) + 0.5 * PI).abs() < 1e-15);
    }

    #[test]
    fn test_half_meridian() {
        assert!((half_meridian() - 20_003_931.458_6).abs() < 1e-2);
    }
}
