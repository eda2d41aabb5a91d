use crate::generator::scene::{Field, Observer};
use log::debug;
use rand::Rng;
use std::f64::consts::PI;
use trackcore::math::geo::{
    closest_point_alpha, geodesic_distance, initial_bearing, interpolate, normalize_bearing,
};
use trackcore::{Sighting, Target};

/// Maximum absolute bearing error (radians) added to simulated sightings.
pub const DEFAULT_BEARING_NOISE: f64 = PI / 10.0;

/// Shifts `bearing` by a uniform error in `[-noise, noise]`.
pub fn add_bearing_noise<R: Rng + ?Sized>(bearing: f64, noise: f64, rng: &mut R) -> f64 {
    normalize_bearing(bearing + noise * (rng.gen::<f64>() * 2.0 - 1.0))
}

/// Sighting `observer` reports for `target`, if the target passes within
/// the observer's radius.
///
/// Segments are scanned in order and the closest in-range point wins. The
/// scan stops at the first out-of-range segment after an in-range one, so a
/// target re-entering the radius later is reported only once.
pub fn sighting_for<R: Rng + ?Sized>(
    target: &Target,
    observer: &Observer,
    bearing_noise: f64,
    rng: &mut R,
) -> Option<Sighting> {
    let mut elapsed = target.start_time();
    let mut closest: Option<(Sighting, f64)> = None;

    for (pair, &length) in target.path().windows(2).zip(target.distances()) {
        let (from, to) = (pair[0], pair[1]);
        let alpha = closest_point_alpha(from, to, observer.location).clamp(0.0, 1.0);
        let point = interpolate(from, to, alpha);
        let distance = geodesic_distance(point, observer.location);

        if distance >= observer.radius {
            if closest.is_some() {
                break;
            }
        } else if closest.map_or(true, |(_, best)| distance < best) {
            let timestamp = elapsed + geodesic_distance(from, point) / target.speed();
            let bearing = add_bearing_noise(initial_bearing(from, to), bearing_noise, rng);
            closest = Some((Sighting::at(timestamp, observer.location, bearing), distance));
        }

        elapsed += length / target.speed();
    }

    closest.map(|(sighting, _)| sighting)
}

/// Every sighting produced by every (target, observer) pair, oldest first.
pub fn generate_sightings<R: Rng + ?Sized>(
    targets: &[Target],
    observers: &[Observer],
    bearing_noise: f64,
    rng: &mut R,
) -> Vec<Sighting> {
    let mut sightings: Vec<Sighting> = targets
        .iter()
        .flat_map(|target| observers.iter().map(move |observer| (target, observer)))
        .filter_map(|(target, observer)| sighting_for(target, observer, bearing_noise, rng))
        .collect();
    sightings.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    sightings
}

/// Ground-truth scenario together with the sightings it produced.
#[derive(Debug, Clone)]
pub struct Simulator {
    field: Field,
    targets: Vec<Target>,
    observers: Vec<Observer>,
    bearing_noise: f64,
    sightings: Vec<Sighting>,
}

impl Simulator {
    pub fn new<R: Rng + ?Sized>(
        targets: Vec<Target>,
        observers: Vec<Observer>,
        field: Field,
        bearing_noise: f64,
        rng: &mut R,
    ) -> Self {
        let sightings = generate_sightings(&targets, &observers, bearing_noise, rng);
        debug!(
            "simulated {} sightings from {} targets and {} observers",
            sightings.len(),
            targets.len(),
            observers.len()
        );
        Self {
            field,
            targets,
            observers,
            bearing_noise,
            sightings,
        }
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn observers(&self) -> &[Observer] {
        &self.observers
    }

    pub fn bearing_noise(&self) -> f64 {
        self.bearing_noise
    }

    pub fn sightings(&self) -> &[Sighting] {
        &self.sightings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scene::observers_along;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use trackcore::math::GeoPoint;
    use trackcore::prelude::DEFAULT_SPEED;

    fn reference_target() -> Target {
        Target::new(
            0.0,
            DEFAULT_SPEED,
            vec![
                GeoPoint::new(45.361285195897885, 33.90794799044153),
                GeoPoint::new(47.487079766379715, 33.081535775384715),
                GeoPoint::new(49.47728424495352, 27.901909920451157),
                GeoPoint::new(49.83269083681804, 24.09401307480089),
            ],
        )
        .unwrap()
    }

    #[test]
    fn observer_out_of_range_reports_nothing() {
        let target = reference_target();
        let observer = Observer::new(GeoPoint::new(40.0, 40.0), 5_000.0);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sighting_for(&target, &observer, DEFAULT_BEARING_NOISE, &mut rng).is_none());
    }

    #[test]
    fn noiseless_sighting_follows_the_segment() {
        let target = reference_target();
        let from = target.path()[1];
        let to = target.path()[2];
        let on_track = interpolate(from, to, 0.5);
        let observer = Observer::new(on_track, 5_000.0);
        let mut rng = StdRng::seed_from_u64(0);

        let sighting = sighting_for(&target, &observer, 0.0, &mut rng).unwrap();
        assert_eq!(sighting.location(), on_track);
        assert!((sighting.bearing - initial_bearing(from, to)).abs() < 1e-12);

        let first_leg = target.distances()[0] / target.speed();
        let expected = first_leg + geodesic_distance(from, on_track) / target.speed();
        assert!((sighting.timestamp - expected).abs() < 1e-6);
    }

    #[test]
    fn sightings_are_sorted_and_near_the_target() {
        let target = reference_target();
        let mut rng = StdRng::seed_from_u64(17);
        let observers = observers_along(target.path(), 10, 5_000.0, 1_000.0, &mut rng);
        let simulator = Simulator::new(
            vec![target.clone()],
            observers,
            Field::default(),
            DEFAULT_BEARING_NOISE,
            &mut rng,
        );

        let sightings = simulator.sightings();
        assert!(sightings.len() >= 25);
        assert!(sightings
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));
        for s in sightings {
            assert!(s.bearing > -PI && s.bearing <= PI);
            let position = target.at_time(s.timestamp, true).unwrap();
            // linear interpolation in degrees is not exactly uniform in meters
            assert!(geodesic_distance(position, s.location()) < 7_500.0);
        }

        assert_eq!(simulator.observers().len(), 30);
    }

    #[test]
    fn bearing_noise_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..500 {
            let noisy = add_bearing_noise(0.5, 0.1, &mut rng);
            assert!((noisy - 0.5).abs() <= 0.1 + 1e-12);
        }
        let wrapped = add_bearing_noise(PI, 0.0, &mut rng);
        assert!((wrapped - PI).abs() < 1e-12);
    }
}
