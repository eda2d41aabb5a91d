use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use trackcore::math::geo::{destination, interpolate, GeoPoint};
use trackcore::prelude::{TrackResult, DEFAULT_SPEED};
use trackcore::Target;

/// Simulated sensor: reports a target passing within `radius` meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub location: GeoPoint,
    pub radius: f64,
}

impl Observer {
    pub fn new(location: GeoPoint, radius: f64) -> Self {
        Self { location, radius }
    }
}

/// Latitude/longitude box that random scenario elements are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub latitude_range: (f64, f64),
    pub longitude_range: (f64, f64),
}

impl Default for Field {
    fn default() -> Self {
        Self {
            latitude_range: (48.598, 49.248),
            longitude_range: (32.767, 33.780),
        }
    }
}

impl Field {
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            0.5 * (self.latitude_range.0 + self.latitude_range.1),
            0.5 * (self.longitude_range.0 + self.longitude_range.1),
        )
    }

    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> GeoPoint {
        GeoPoint::new(
            lerp(self.latitude_range, rng.gen::<f64>()),
            lerp(self.longitude_range, rng.gen::<f64>()),
        )
    }
}

fn lerp((a, b): (f64, f64), alpha: f64) -> f64 {
    a + alpha * (b - a)
}

/// Random location along the segment `from -> to`, pushed up to
/// `max_distance` meters away in a random direction.
pub fn random_location<R: Rng + ?Sized>(
    from: GeoPoint,
    to: GeoPoint,
    max_distance: f64,
    rng: &mut R,
) -> GeoPoint {
    let on_segment = interpolate(from, to, rng.gen::<f64>());
    let offset = max_distance * rng.gen::<f64>();
    destination(on_segment, rng.gen::<f64>() * 2.0 * PI, offset)
}

/// Scatters `per_segment` observers along every segment of `path`.
pub fn observers_along<R: Rng + ?Sized>(
    path: &[GeoPoint],
    per_segment: usize,
    radius: f64,
    jitter: f64,
    rng: &mut R,
) -> Vec<Observer> {
    let mut observers = Vec::with_capacity(path.len().saturating_sub(1) * per_segment);
    for pair in path.windows(2) {
        for _ in 0..per_segment {
            let location = random_location(pair[0], pair[1], jitter, rng);
            observers.push(Observer::new(location, radius));
        }
    }
    observers
}

/// Places `count` observers uniformly inside the field.
pub fn observers_in_field<R: Rng + ?Sized>(
    field: &Field,
    count: usize,
    radius: f64,
    rng: &mut R,
) -> Vec<Observer> {
    (0..count)
        .map(|_| Observer::new(field.random_point(rng), radius))
        .collect()
}

/// Ground-truth targets flying through random waypoints of the field,
/// starting within `start_window` seconds of zero.
pub fn random_targets<R: Rng + ?Sized>(
    field: &Field,
    count: usize,
    waypoints: usize,
    start_window: f64,
    rng: &mut R,
) -> TrackResult<Vec<Target>> {
    (0..count)
        .map(|_| {
            let path = (0..waypoints.max(2))
                .map(|_| field.random_point(rng))
                .collect();
            let start_time = start_window.max(0.0) * rng.gen::<f64>();
            Target::new(start_time, DEFAULT_SPEED, path)
        })
        .collect()
}
