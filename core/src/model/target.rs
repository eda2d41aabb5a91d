use crate::math::geo::{geodesic_distance, interpolate, GeoPoint};
use crate::prelude::{TrackError, TrackResult};

/// A reconstructed trajectory: a waypoint path flown at constant speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    start_time: f64,
    speed: f64,
    path: Vec<GeoPoint>,
    distances: Vec<f64>,
    end_time: f64,
}

impl Target {
    /// Builds a target, deriving per-segment distances and the end time.
    ///
    /// Fails when the speed is not a positive finite number, the path has
    /// fewer than two waypoints, or any value is not finite.
    pub fn new(start_time: f64, speed: f64, path: Vec<GeoPoint>) -> TrackResult<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(TrackError::InvalidTarget(format!(
                "speed must be positive, got {}",
                speed
            )));
        }
        if path.len() < 2 {
            return Err(TrackError::InvalidTarget(format!(
                "path needs at least 2 waypoints, got {}",
                path.len()
            )));
        }
        if !start_time.is_finite()
            || path
                .iter()
                .any(|p| !p.latitude.is_finite() || !p.longitude.is_finite())
        {
            return Err(TrackError::InvalidTarget("non-finite coordinates".into()));
        }

        let distances: Vec<f64> = path
            .windows(2)
            .map(|pair| geodesic_distance(pair[0], pair[1]))
            .collect();
        let end_time = start_time + distances.iter().sum::<f64>() / speed;

        Ok(Self {
            start_time,
            speed,
            path,
            distances,
            end_time,
        })
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn path(&self) -> &[GeoPoint] {
        &self.path
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    pub fn start_location(&self) -> GeoPoint {
        self.path[0]
    }

    pub fn end_location(&self) -> GeoPoint {
        self.path[self.path.len() - 1]
    }

    pub fn total_distance(&self) -> f64 {
        self.distances.iter().sum()
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Position of the target at `timestamp`.
    ///
    /// Outside `[start_time, end_time]` the position is projected along the
    /// first or last segment when `extrapolate` is set, otherwise `None`.
    pub fn at_time(&self, timestamp: f64, extrapolate: bool) -> Option<GeoPoint> {
        let duration = self.duration();
        let last = self.path.len() - 1;

        if timestamp < self.start_time || timestamp > self.end_time {
            if !extrapolate {
                return None;
            }
            if duration <= 0.0 {
                return Some(self.path[0]);
            }
            return Some(if timestamp < self.start_time {
                let alpha = (timestamp - self.start_time) / duration;
                interpolate(self.path[0], self.path[1], alpha)
            } else {
                let alpha = 1.0 + (timestamp - self.end_time) / duration;
                interpolate(self.path[last - 1], self.path[last], alpha)
            });
        }

        let mut elapsed = self.start_time;
        for (idx, &distance) in self.distances.iter().enumerate() {
            let segment_time = distance / self.speed;
            if segment_time > 0.0 && timestamp <= elapsed + segment_time {
                let alpha = (timestamp - elapsed) / segment_time;
                return Some(interpolate(self.path[idx], self.path[idx + 1], alpha));
            }
            elapsed += segment_time;
        }

        if duration <= 0.0 {
            return Some(self.path[0]);
        }
        Some(self.path[last])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::DEFAULT_SPEED;

    fn straight() -> Target {
        Target::new(
            100.0,
            DEFAULT_SPEED,
            vec![GeoPoint::new(48.6, 32.8), GeoPoint::new(49.2, 33.7)],
        )
        .unwrap()
    }

    fn cross(o: GeoPoint, a: GeoPoint, b: GeoPoint) -> f64 {
        (a.latitude - o.latitude) * (b.longitude - o.longitude)
            - (a.longitude - o.longitude) * (b.latitude - o.latitude)
    }

    #[test]
    fn rejects_invalid_targets() {
        let path = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)];
        assert!(Target::new(0.0, 0.0, path.clone()).is_err());
        assert!(Target::new(0.0, f64::NAN, path.clone()).is_err());
        assert!(Target::new(0.0, 10.0, vec![GeoPoint::new(0.0, 0.0)]).is_err());
        assert!(Target::new(f64::INFINITY, 10.0, path).is_err());
    }

    #[test]
    fn derives_distances_and_end_time() {
        let target = straight();
        assert_eq!(target.distances().len(), 1);
        assert_eq!(
            target.distances()[0],
            geodesic_distance(target.start_location(), target.end_location())
        );
        assert!(target.end_time() > target.start_time());
        assert!(
            (target.end_time() - target.start_time() - target.total_distance() / DEFAULT_SPEED)
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn positions_inside_window_lie_on_the_path() {
        let target = straight();
        let (a, b) = (target.path()[0], target.path()[1]);
        for k in 0..=10 {
            let t = target.start_time() + target.duration() * k as f64 / 10.0;
            let pos = target.at_time(t, true).unwrap();
            assert!(cross(a, b, pos).abs() < 1e-9);
        }
        assert_eq!(target.at_time(target.start_time(), false), Some(a));
    }

    #[test]
    fn continuous_at_end_time() {
        let target = straight();
        let end = target.end_time();
        let before = target.at_time(end - 1e-6, true).unwrap();
        let after = target.at_time(end + 1e-6, true).unwrap();
        assert!((before.latitude - after.latitude).abs() < 1e-6);
        assert!((before.longitude - after.longitude).abs() < 1e-6);
    }

    #[test]
    fn extrapolates_along_first_and_last_segments() {
        let target = straight();
        let (a, b) = (target.path()[0], target.path()[1]);
        let early = target.at_time(target.start_time() - target.duration(), true).unwrap();
        let late = target.at_time(target.end_time() + target.duration(), true).unwrap();
        assert!((early.latitude - (2.0 * a.latitude - b.latitude)).abs() < 1e-9);
        assert!((late.latitude - (2.0 * b.latitude - a.latitude)).abs() < 1e-9);
        assert!(target.at_time(target.start_time() - 1.0, false).is_none());
        assert!(target.at_time(target.end_time() + 1.0, false).is_none());
    }

    #[test]
    fn walks_multi_segment_paths() {
        let path = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(1.0, 1.0),
        ];
        let target = Target::new(0.0, 100.0, path.clone()).unwrap();
        let first_leg = target.distances()[0] / 100.0;
        let corner = target.at_time(first_leg, false).unwrap();
        assert!((corner.longitude - 1.0).abs() < 1e-9);
        let halfway_second = target
            .at_time(first_leg + target.distances()[1] / 200.0, false)
            .unwrap();
        assert!((halfway_second.latitude - 0.5).abs() < 1e-9);
        let end = target.at_time(target.end_time(), false).unwrap();
        assert!((end.latitude - path[2].latitude).abs() < 1e-9);
        assert!((end.longitude - path[2].longitude).abs() < 1e-9);
    }

    #[test]
    fn zero_length_path_stays_put() {
        let p = GeoPoint::new(10.0, 20.0);
        let target = Target::new(5.0, DEFAULT_SPEED, vec![p, p]).unwrap();
        assert_eq!(target.end_time(), target.start_time());
        assert_eq!(target.at_time(5.0, false), Some(p));
        assert_eq!(target.at_time(-50.0, true), Some(p));
        assert_eq!(target.at_time(500.0, true), Some(p));
    }
}
