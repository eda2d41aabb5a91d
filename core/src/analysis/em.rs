use crate::analysis::estimator::estimate_segment;
use crate::interface::Sighting;
use crate::math::geo::geodesic_distance;
use crate::model::Target;
use crate::prelude::{AnalysisConfig, StopCondition, TrackError, TrackResult, DEFAULT_SPEED};
use log::debug;
use rand::seq::index;
use rand::Rng;
use std::collections::BTreeMap;

/// Index and distance (meters) of the target closest to `sighting` at its
/// timestamp. The first target wins ties.
fn nearest_target(sighting: &Sighting, targets: &[Target]) -> Option<(usize, f64)> {
    let location = sighting.location();
    let mut best: Option<(usize, f64)> = None;
    for (idx, target) in targets.iter().enumerate() {
        let Some(position) = target.at_time(sighting.timestamp, true) else {
            continue;
        };
        let distance = geodesic_distance(position, location);
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((idx, distance));
        }
    }
    best
}

/// Assigns every sighting to the index of its closest target.
pub fn sightings_to_targets(sightings: &[Sighting], targets: &[Target]) -> TrackResult<Vec<usize>> {
    if targets.is_empty() {
        return Err(TrackError::NoTargets);
    }
    sightings
        .iter()
        .map(|s| {
            nearest_target(s, targets)
                .map(|(idx, _)| idx)
                .ok_or(TrackError::NoTargets)
        })
        .collect()
}

/// Sum of the distances (meters) between each sighting and its closest target.
pub fn assignment_cost(sightings: &[Sighting], targets: &[Target]) -> TrackResult<f64> {
    if targets.is_empty() {
        return Err(TrackError::NoTargets);
    }
    Ok(sightings
        .iter()
        .filter_map(|s| nearest_target(s, targets))
        .map(|(_, distance)| distance)
        .sum())
}

/// Seed segment connecting two distinct random sightings, earliest first.
pub fn random_target<R: Rng + ?Sized>(sightings: &[Sighting], rng: &mut R) -> TrackResult<Target> {
    if sightings.len() < 2 {
        return Err(TrackError::InvalidTarget(
            "need two sightings to seed a segment".into(),
        ));
    }
    let picked = index::sample(rng, sightings.len(), 2);
    let (mut start, mut end) = (sightings[picked.index(0)], sightings[picked.index(1)]);
    if start.timestamp > end.timestamp {
        std::mem::swap(&mut start, &mut end);
    }
    Target::new(
        start.timestamp,
        DEFAULT_SPEED,
        vec![start.location(), end.location()],
    )
}

/// Expectation-maximization over straight constant-speed segments.
///
/// Each iteration assigns sightings to their closest segment and refits every
/// segment from its members. Segments that attract nothing are replaced by
/// fresh random seeds so the count stays at `n_segments`.
#[derive(Debug, Clone)]
pub struct EmDriver {
    n_segments: usize,
    iterations: usize,
    stop: StopCondition,
    restarts: usize,
}

impl EmDriver {
    pub fn new(n_segments: usize, iterations: usize) -> Self {
        Self {
            n_segments,
            iterations,
            stop: StopCondition::Fixed,
            restarts: 1,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.n_segments, config.iterations)
            .with_stop(config.stop)
            .with_restarts(config.restarts)
    }

    pub fn with_stop(mut self, stop: StopCondition) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts.max(1);
        self
    }

    pub fn n_segments(&self) -> usize {
        self.n_segments
    }

    /// Runs the configured number of restarts and keeps the targets with the
    /// lowest total assignment distance.
    pub fn run<R: Rng + ?Sized>(
        &self,
        sightings: &[Sighting],
        rng: &mut R,
    ) -> TrackResult<Vec<Target>> {
        if sightings.len() < 2 || self.n_segments == 0 {
            return Ok(Vec::new());
        }

        let mut best: Option<(Vec<Target>, f64)> = None;
        for restart in 0..self.restarts {
            let (targets, refits) = self.run_once(sightings, rng)?;
            let cost = assignment_cost(sightings, &targets)?;
            debug!(
                "EM restart {} finished after {} refits with cost {:.1} m",
                restart, refits, cost
            );
            if best.as_ref().map_or(true, |(_, best_cost)| cost < *best_cost) {
                best = Some((targets, cost));
            }
        }
        Ok(best.map(|(targets, _)| targets).unwrap_or_default())
    }

    /// One EM run from random seeds. Returns the targets and the number of
    /// refit iterations performed.
    fn run_once<R: Rng + ?Sized>(
        &self,
        sightings: &[Sighting],
        rng: &mut R,
    ) -> TrackResult<(Vec<Target>, usize)> {
        let mut targets = (0..self.n_segments)
            .map(|_| random_target(sightings, rng))
            .collect::<TrackResult<Vec<_>>>()?;
        let mut previous: Option<Vec<usize>> = None;
        let mut refits = 0;

        for iteration in 0..self.iterations {
            let assignment = sightings_to_targets(sightings, &targets)?;
            if self.stop == StopCondition::UntilStable && previous.as_ref() == Some(&assignment) {
                debug!("EM assignment stable after {} iterations", iteration);
                break;
            }

            let mut clusters: BTreeMap<usize, Vec<Sighting>> = BTreeMap::new();
            for (sighting, &idx) in sightings.iter().zip(&assignment) {
                clusters.entry(idx).or_default().push(*sighting);
            }

            targets = clusters
                .values()
                .map(|cluster| estimate_segment(cluster))
                .collect::<TrackResult<Vec<_>>>()?;
            let refitted = targets.len();
            while targets.len() < self.n_segments {
                targets.push(random_target(sightings, rng)?);
            }
            debug!(
                "EM iteration {}: {} clusters refitted, {} reseeded",
                iteration,
                refitted,
                self.n_segments - refitted
            );

            previous = Some(assignment);
            refits += 1;
        }

        Ok((targets, refits))
    }
}

/// Convenience wrapper running a single fixed-iteration EM pass.
pub fn expectation_maximization<R: Rng + ?Sized>(
    sightings: &[Sighting],
    n_segments: usize,
    iterations: usize,
    rng: &mut R,
) -> TrackResult<Vec<Target>> {
    EmDriver::new(n_segments, iterations).run(sightings, rng)
}
