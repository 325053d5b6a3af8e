//! Property checks for the geodesic kernel
//!
//! Points are drawn from seeded generators so failures are reproducible.

use fixdist_core::{distance, DistanceMethod, GeoPoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLES: usize = 500;

fn random_point(rng: &mut StdRng) -> GeoPoint {
    let lon = rng.gen_range(-180.0..=180.0);
    let lat = rng.gen_range(-90.0..=90.0);
    GeoPoint::new(lon, lat).expect("generator stays in range")
}

fn home() -> GeoPoint {
    GeoPoint::new(8.4043, 49.0140).unwrap()
}

// ============================================================================
// Metric properties
// ============================================================================

#[test]
fn test_distance_is_non_negative_and_finite() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0001);
    for _ in 0..SAMPLES {
        let a = random_point(&mut rng);
        let b = random_point(&mut rng);
        let r = distance(&a, &b);
        assert!(r.metres >= 0.0, "{a} -> {b}: {}", r.metres);
        assert!(r.metres.is_finite(), "{a} -> {b}: {}", r.metres);
        assert!((0.0..360.0).contains(&r.initial_bearing));
        assert!((0.0..360.0).contains(&r.final_bearing));
    }
}

#[test]
fn test_distance_to_self_is_zero() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0002);
    for _ in 0..SAMPLES {
        let a = random_point(&mut rng);
        assert!(distance(&a, &a).metres < 1e-3);
    }
}

#[test]
fn test_distance_is_symmetric() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0003);
    for _ in 0..SAMPLES {
        let a = random_point(&mut rng);
        let b = random_point(&mut rng);
        let there = distance(&a, &b).metres;
        let back = distance(&b, &a).metres;
        assert!((there - back).abs() < 1e-6, "{a} <-> {b}: {there} vs {back}");
    }
}

#[test]
fn test_triangle_inequality_holds() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0004);
    for _ in 0..SAMPLES {
        let a = random_point(&mut rng);
        let b = random_point(&mut rng);
        let c = random_point(&mut rng);
        let direct = distance(&a, &c).metres;
        let via = distance(&a, &b).metres + distance(&b, &c).metres;
        assert!(direct <= via + 1e-3, "{a} -> {c} = {direct}, via {b} = {via}");
    }
}

#[test]
fn test_antipodal_distance_is_half_meridian() {
    let mut rng = StdRng::seed_from_u64(0x5eed_0005);
    for _ in 0..SAMPLES {
        let a = random_point(&mut rng);
        let d = distance(&a, &a.antipode()).metres;
        assert!(
            (20_003_000.0..=20_004_000.0).contains(&d),
            "{a} -> antipode = {d}"
        );
    }
}

#[test]
fn test_poles_and_dateline_are_handled() {
    let north = GeoPoint::new(0.0, 90.0).unwrap();
    let south = GeoPoint::new(77.0, -90.0).unwrap();
    let d = distance(&north, &south).metres;
    assert!((20_003_000.0..=20_004_000.0).contains(&d));

    let east = GeoPoint::new(179.5, 10.0).unwrap();
    let west = GeoPoint::new(-179.5, 10.0).unwrap();
    let across = distance(&east, &west);
    assert_eq!(across.method, DistanceMethod::Vincenty);
    assert!(across.metres < 110_000.0, "dateline crossing took the long way");
}

// ============================================================================
// Reference distances to the default home coordinate
// ============================================================================

#[test]
fn test_reference_distances_from_home() {
    // (lon, lat, metres, whole km) against a double-precision Vincenty reference
    let cases = [
        (8.4043, 49.0140, 0.0, 0),
        (8.4200, 49.0140, 1_148.475, 1),
        (13.4050, 52.5200, 525_659.014, 525),
        (-0.1276, 51.5074, 668_087.664, 668),
        (139.6917, 35.6895, 9_463_506.661, 9463),
    ];

    for (lon, lat, metres, km) in cases {
        let fix = GeoPoint::new(lon, lat).unwrap();
        let r = distance(&fix, &home());
        assert!((r.metres - metres).abs() < 0.01, "({lon}, {lat}): {}", r.metres);
        assert_eq!(r.whole_kilometres(), km);
    }
}

#[test]
fn test_antipode_of_home_is_half_meridian() {
    let fix = GeoPoint::new(-171.5957, -49.0140).unwrap();
    let r = distance(&fix, &home());
    assert!(
        (20_003_000.0..=20_004_000.0).contains(&r.metres),
        "got {} via {}",
        r.metres,
        r.method
    );
    assert_eq!(r.method, DistanceMethod::Antipodal);
    assert_eq!(r.whole_kilometres(), 20_003);
}

#[test]
fn test_bearings_match_reference() {
    let berlin = GeoPoint::new(13.4050, 52.5200).unwrap();
    let r = distance(&berlin, &home());
    assert!((r.initial_bearing - 224.091_410).abs() < 1e-5);
    assert!((r.final_bearing - 220.215_164).abs() < 1e-5);

    let back = distance(&home(), &berlin);
    assert!((back.initial_bearing - 40.215_164).abs() < 1e-5);
}
