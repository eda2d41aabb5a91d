use crate::interface::Sighting;
use crate::math::geo::{geodesic_distance, GeoPoint};
use crate::math::matrix::MatrixHelper;
use crate::math::stats::StatsHelper;
use crate::model::Target;
use crate::prelude::{TrackError, TrackResult, DEFAULT_SPEED};
use log::debug;
use ndarray::{Array1, Array2};

/// Fits the single straight segment that best explains a cluster of sightings.
///
/// Assumes linear motion in both coordinates:
///
/// ```text
/// latitude  = dlat * t + lat0
/// longitude = dlon * t + lon0
/// ```
///
/// and solves the stacked system
///
/// ```text
/// | t 1 0 0 |   | dlat |   | latitude  |
/// | ...     | * | lat0 | = | ...       |
/// | 0 0 t 1 |   | dlon |   | longitude |
/// | ...     |   | lon0 |   | ...       |
/// ```
///
/// Timestamps are centered on their mean before solving. The system is
/// solved for the minimum-norm solution, so a single sighting or a cluster
/// sharing one timestamp yields zero slopes. When the fitted segment has no
/// duration or no speed the result is a zero-length target parked at the
/// cluster's mean position and moving at [`DEFAULT_SPEED`].
pub fn estimate_segment(sightings: &[Sighting]) -> TrackResult<Target> {
    if sightings.is_empty() {
        return Err(TrackError::EmptyCluster);
    }

    let n = sightings.len();
    let timestamps: Vec<f64> = sightings.iter().map(|s| s.timestamp).collect();
    let latitudes: Vec<f64> = sightings.iter().map(|s| s.latitude).collect();
    let longitudes: Vec<f64> = sightings.iter().map(|s| s.longitude).collect();
    let t_mean = StatsHelper::mean(&timestamps);

    let mut a = Array2::<f64>::zeros((2 * n, 4));
    let mut b = Array1::<f64>::zeros(2 * n);
    for (i, s) in sightings.iter().enumerate() {
        let tau = s.timestamp - t_mean;
        a[[i, 0]] = tau;
        a[[i, 1]] = 1.0;
        a[[n + i, 2]] = tau;
        a[[n + i, 3]] = 1.0;
        b[i] = s.latitude;
        b[n + i] = s.longitude;
    }

    let solution = MatrixHelper::least_squares(a.view(), b.view())?;
    let (dlat, lat0, dlon, lon0) = (
        solution.x[0],
        solution.x[1],
        solution.x[2],
        solution.x[3],
    );
    let misfit: Vec<f64> = sightings
        .iter()
        .map(|s| {
            let tau = s.timestamp - t_mean;
            geodesic_distance(
                GeoPoint::new(dlat * tau + lat0, dlon * tau + lon0),
                s.location(),
            )
        })
        .collect();
    debug!(
        "segment fit over {} sightings: dlat={:e} lat0={:.6} dlon={:e} lon0={:.6} residual={:.3e} rms={:.1} m rank={}",
        n,
        dlat,
        lat0,
        dlon,
        lon0,
        solution.residual,
        StatsHelper::rms(&misfit),
        solution.rank
    );

    // every vector is non-empty here
    let lat_bounds = StatsHelper::bounds(&latitudes).unwrap_or((lat0, lat0));
    let lon_bounds = StatsHelper::bounds(&longitudes).unwrap_or((lon0, lon0));
    let (tau_min, tau_max) = StatsHelper::bounds(&timestamps)
        .map(|(lo, hi)| (lo - t_mean, hi - t_mean))
        .unwrap_or((0.0, 0.0));

    let lat_range = if dlat < 0.0 {
        (lat_bounds.1, lat_bounds.0)
    } else {
        lat_bounds
    };
    let lon_range = if dlon < 0.0 {
        (lon_bounds.1, lon_bounds.0)
    } else {
        lon_bounds
    };

    let tau_start = time_at(lat_range.0, dlat, lat0, tau_min).min(time_at(
        lon_range.0,
        dlon,
        lon0,
        tau_min,
    ));
    let tau_end = time_at(lat_range.1, dlat, lat0, tau_max).max(time_at(
        lon_range.1,
        dlon,
        lon0,
        tau_max,
    ));

    let from = GeoPoint::new(dlat * tau_start + lat0, dlon * tau_start + lon0);
    let to = GeoPoint::new(dlat * tau_end + lat0, dlon * tau_end + lon0);
    let duration = tau_end - tau_start;
    let speed = geodesic_distance(from, to) / duration;

    if duration > 0.0 && speed.is_finite() && speed > 0.0 {
        return Target::new(tau_start + t_mean, speed, vec![from, to]);
    }

    debug!(
        "degenerate cluster of {} sightings (duration {}), parking segment at mean position",
        n, duration
    );
    let center = GeoPoint::new(
        StatsHelper::mean(&latitudes),
        StatsHelper::mean(&longitudes),
    );
    let start_time = if tau_start.is_finite() {
        tau_start + t_mean
    } else {
        t_mean
    };
    Target::new(start_time, DEFAULT_SPEED, vec![center, center])
}

/// Time at which `slope * t + intercept` reaches `value`.
fn time_at(value: f64, slope: f64, intercept: f64, fallback: f64) -> f64 {
    if slope != 0.0 {
        (value - intercept) / slope
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn along_line(count: usize, t0: f64, dt: f64) -> Vec<Sighting> {
        (0..count)
            .map(|i| {
                let t = t0 + dt * i as f64;
                Sighting::new(t, 48.0 + 0.001 * (t - t0), 33.0 - 0.002 * (t - t0), 0.0)
            })
            .collect()
    }

    #[test]
    fn empty_cluster_is_an_error() {
        assert!(matches!(
            estimate_segment(&[]),
            Err(TrackError::EmptyCluster)
        ));
    }

    #[test]
    fn recovers_exact_linear_motion() {
        let sightings = along_line(20, 1_700_000_000.0, 10.0);
        let target = estimate_segment(&sightings).unwrap();

        let first = sightings[0];
        let last = sightings[sightings.len() - 1];
        assert!((target.start_time() - first.timestamp).abs() < 1e-3);
        assert!((target.end_time() - last.timestamp).abs() < 1e-3);

        // latitude increases, longitude decreases
        let start = target.start_location();
        let end = target.end_location();
        assert!((start.latitude - first.latitude).abs() < 1e-7);
        assert!((start.longitude - first.longitude).abs() < 1e-7);
        assert!((end.latitude - last.latitude).abs() < 1e-7);
        assert!((end.longitude - last.longitude).abs() < 1e-7);

        let expected_speed =
            geodesic_distance(first.location(), last.location()) / (last.timestamp - first.timestamp);
        assert!((target.speed() - expected_speed).abs() / expected_speed < 1e-6);
    }

    #[test]
    fn fitted_positions_match_sightings() {
        let sightings = along_line(5, 0.0, 60.0);
        let target = estimate_segment(&sightings).unwrap();
        for s in &sightings {
            let pos = target.at_time(s.timestamp, true).unwrap();
            assert!((pos.latitude - s.latitude).abs() < 1e-6);
            assert!((pos.longitude - s.longitude).abs() < 1e-6);
        }
    }

    #[test]
    fn single_sighting_parks_at_its_location() {
        let s = Sighting::new(1_700_000_000.0, 49.0, 33.5, 0.3);
        let target = estimate_segment(&[s]).unwrap();
        assert_eq!(target.speed(), DEFAULT_SPEED);
        assert_eq!(target.start_time(), s.timestamp);
        assert!((target.start_location().latitude - 49.0).abs() < 1e-9);
        assert!((target.start_location().longitude - 33.5).abs() < 1e-9);
        assert_eq!(target.total_distance(), 0.0);
    }

    #[test]
    fn duplicate_timestamps_do_not_fail() {
        let sightings = vec![
            Sighting::new(500.0, 48.0, 33.0, 0.0),
            Sighting::new(500.0, 48.2, 33.4, 0.0),
            Sighting::new(500.0, 48.4, 33.2, 0.0),
        ];
        let target = estimate_segment(&sightings).unwrap();
        assert!(target.speed() > 0.0);
        assert!(target.end_time() >= target.start_time());
        assert!((target.start_location().latitude - 48.2).abs() < 1e-9);
        assert!((target.start_location().longitude - 33.2).abs() < 1e-9);
    }
}
