//! Spherical geometry helpers over geographic coordinates.
//!
//! Points are (latitude, longitude) in degrees. Projection and interpolation
//! work directly in degree space, which is accurate enough at the scale of a
//! single flight path and away from the antimeridian.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

const TWO_PI: f64 = 2.0 * PI;

/// Geographic location, serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl From<[f64; 2]> for GeoPoint {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<GeoPoint> for [f64; 2] {
    fn from(point: GeoPoint) -> Self {
        [point.latitude, point.longitude]
    }
}

impl From<(f64, f64)> for GeoPoint {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Great-circle (haversine) distance in meters.
pub fn geodesic_distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let phi1 = p1.latitude.to_radians();
    let phi2 = p2.latitude.to_radians();
    let d_phi = phi2 - phi1;
    let d_lambda = (p2.longitude - p1.longitude).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Returns `alpha` such that `p1 + alpha * (p2 - p1)` is the point on the
/// line through `p1` and `p2` closest to `x`.
///
/// Alpha is not clamped: values outside `[0, 1]` mean the closest point lies
/// beyond one of the endpoints. A degenerate segment yields `0.0`.
pub fn closest_point_alpha(p1: GeoPoint, p2: GeoPoint, x: GeoPoint) -> f64 {
    let dx = p2.latitude - p1.latitude;
    let dy = p2.longitude - p1.longitude;
    let norm = dx * dx + dy * dy;
    if norm == 0.0 {
        return 0.0;
    }
    ((x.latitude - p1.latitude) * dx + (x.longitude - p1.longitude) * dy) / norm
}

/// Initial bearing (radians, clockwise from true north) on the great circle
/// from `p1` to `p2`.
pub fn initial_bearing(p1: GeoPoint, p2: GeoPoint) -> f64 {
    let phi1 = p1.latitude.to_radians();
    let phi2 = p2.latitude.to_radians();
    let d_lambda = (p2.longitude - p1.longitude).to_radians();

    let x = d_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    x.atan2(y)
}

/// Wraps a bearing into `(-pi, pi]`.
pub fn normalize_bearing(bearing: f64) -> f64 {
    if !bearing.is_finite() {
        return bearing;
    }
    let mut value = bearing;
    if value.abs() > 64.0 * TWO_PI {
        // coarse reduction first so huge inputs don't loop for long
        value %= TWO_PI;
    }
    while value > PI {
        value -= TWO_PI;
    }
    while value <= -PI {
        value += TWO_PI;
    }
    value
}

/// Linear interpolation of latitude and longitude. Alpha outside `[0, 1]`
/// extrapolates past the endpoints.
pub fn interpolate(p1: GeoPoint, p2: GeoPoint, alpha: f64) -> GeoPoint {
    GeoPoint::new(
        p1.latitude + alpha * (p2.latitude - p1.latitude),
        p1.longitude + alpha * (p2.longitude - p1.longitude),
    )
}

/// Point reached by travelling `distance` meters from `origin` along the
/// great circle with initial `bearing` (radians).
pub fn destination(origin: GeoPoint, bearing: f64, distance: f64) -> GeoPoint {
    let delta = distance / EARTH_RADIUS_M;
    let phi1 = origin.latitude.to_radians();
    let lambda1 = origin.longitude.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (bearing.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    GeoPoint::new(phi2.to_degrees(), lambda2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn closest_point_inside_segment() {
        assert!((closest_point_alpha(p(0.0, 0.0), p(4.0, 0.0), p(1.0, 2.0)) - 0.25).abs() < 1e-9);
        assert!(
            (closest_point_alpha(p(0.0, 1.0), p(0.0, 4.0), p(1.0, 2.0)) - 1.0 / 3.0).abs() < 1e-9
        );
    }

    #[test]
    fn closest_point_outside_segment_is_not_clamped() {
        assert!((closest_point_alpha(p(0.0, 0.0), p(4.0, 0.0), p(5.0, 2.0)) - 1.25).abs() < 1e-9);
        assert!(
            (closest_point_alpha(p(0.0, 1.0), p(0.0, 4.0), p(2.0, 0.0)) + 1.0 / 3.0).abs() < 1e-9
        );
    }

    #[test]
    fn closest_point_on_degenerate_segment() {
        assert_eq!(closest_point_alpha(p(1.0, 1.0), p(1.0, 1.0), p(3.0, 2.0)), 0.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        assert!(initial_bearing(p(10.0, 10.0), p(20.0, 10.0)).abs() < 1e-5);
        assert!((initial_bearing(p(20.0, 10.0), p(10.0, 10.0)) - PI).abs() < 1e-5);
        assert!((initial_bearing(p(0.0, 20.0), p(0.0, 10.0)) + PI / 2.0).abs() < 1e-5);
        assert!((initial_bearing(p(0.0, 10.0), p(0.0, 20.0)) - PI / 2.0).abs() < 1e-5);
    }

    #[test]
    fn normalize_bearing_range_and_idempotence() {
        for &x in &[0.0, PI, -PI, 3.5 * PI, -7.25 * PI, 1e6, -1e6, 123.456] {
            let n = normalize_bearing(x);
            assert!(n > -PI && n <= PI, "{} -> {}", x, n);
            assert_eq!(normalize_bearing(n), n);
        }
        assert_eq!(normalize_bearing(-PI), PI);
    }

    #[test]
    fn distance_of_one_degree_on_equator() {
        let d = geodesic_distance(p(0.0, 0.0), p(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 10.0);
        assert_eq!(geodesic_distance(p(45.0, 33.0), p(45.0, 33.0)), 0.0);
    }

    #[test]
    fn interpolate_extrapolates_linearly() {
        let a = p(10.0, 20.0);
        let b = p(12.0, 24.0);
        assert_eq!(interpolate(a, b, 0.5), p(11.0, 22.0));
        assert_eq!(interpolate(a, b, 2.0), p(14.0, 28.0));
        assert_eq!(interpolate(a, b, -1.0), p(8.0, 16.0));
    }

    #[test]
    fn destination_matches_distance_and_bearing() {
        let origin = p(48.9, 33.2);
        let target = destination(origin, PI / 4.0, 5_000.0);
        assert!((geodesic_distance(origin, target) - 5_000.0).abs() < 1e-3);
        assert!((initial_bearing(origin, target) - PI / 4.0).abs() < 1e-6);
    }

    #[test]
    fn geopoint_serializes_as_pair() {
        let json = serde_json::to_string(&p(1.5, -2.25)).unwrap();
        assert_eq!(json, "[1.5,-2.25]");
        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p(1.5, -2.25));
    }
}
