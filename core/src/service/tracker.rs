use crate::analysis::EmDriver;
use crate::interface::{Sighting, TargetRecord};
use crate::model::Target;
use crate::prelude::{AnalysisConfig, TrackError, TrackResult};
use crate::service::scheduler::ServiceHost;
use crate::store::SightingStore;
use crate::telemetry::{LogManager, MetricsRecorder, MetricsSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

/// Ties a sighting store to periodic trajectory analysis.
///
/// Each analysis round reads the whole store, runs EM and replaces the
/// published target list in one swap. Readers get an `Arc` snapshot and never
/// observe a partially updated list.
pub struct Tracker {
    store: Arc<dyn SightingStore>,
    config: AnalysisConfig,
    targets: RwLock<Arc<Vec<Target>>>,
    rng: Mutex<StdRng>,
    metrics: MetricsRecorder,
    logger: LogManager,
}

impl Tracker {
    pub fn new(store: Arc<dyn SightingStore>, config: AnalysisConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            store,
            config,
            targets: RwLock::new(Arc::new(Vec::new())),
            rng: Mutex::new(rng),
            metrics: MetricsRecorder::new(),
            logger: LogManager::new("tracker"),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn add_sighting(&self, sighting: Sighting) -> TrackResult<Sighting> {
        self.store.add_sighting(sighting)
    }

    pub fn list_sightings(&self) -> TrackResult<Vec<Sighting>> {
        self.store.list_sightings()
    }

    /// Most recently published targets; empty before the first round.
    pub fn list_targets(&self) -> Arc<Vec<Target>> {
        match self.targets.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn target_records(&self) -> Vec<TargetRecord> {
        self.list_targets().iter().map(TargetRecord::from).collect()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Runs one analysis round and publishes its targets. On failure the
    /// previously published list stays in place.
    pub fn analyze(&self) -> TrackResult<usize> {
        let started = Instant::now();
        match self.compute_round() {
            Ok((sightings, targets)) => {
                let count = targets.len();
                self.publish(targets)?;
                self.metrics.record_round(count);
                self.logger
                    .round_published(sightings, count, started.elapsed());
                Ok(count)
            }
            Err(err) => {
                self.metrics.record_failure();
                self.logger.round_failed(&err);
                Err(err)
            }
        }
    }

    fn compute_round(&self) -> TrackResult<(usize, Vec<Target>)> {
        let sightings = self.store.list_sightings()?;
        // draw a per-round seed so the shared generator isn't held during EM
        let seed: u64 = self
            .rng
            .lock()
            .map_err(|_| TrackError::Service("tracker rng lock poisoned".into()))?
            .gen();
        let mut rng = StdRng::seed_from_u64(seed);
        let targets = EmDriver::from_config(&self.config).run(&sightings, &mut rng)?;
        Ok((sightings.len(), targets))
    }

    fn publish(&self, targets: Vec<Target>) -> TrackResult<()> {
        let mut guard = self
            .targets
            .write()
            .map_err(|_| TrackError::Service("target list lock poisoned".into()))?;
        *guard = Arc::new(targets);
        Ok(())
    }

    /// Drops sightings older than `sighting_ttl` seconds before the newest one.
    pub fn cleanup(&self) -> TrackResult<usize> {
        if self.config.sighting_ttl.is_nan() || self.config.sighting_ttl <= 0.0 {
            return Ok(0);
        }
        let newest = self
            .store
            .list_sightings()?
            .iter()
            .map(|s| s.timestamp)
            .fold(f64::NEG_INFINITY, f64::max);
        if !newest.is_finite() {
            return Ok(0);
        }

        let removed = self.store.remove_before(newest - self.config.sighting_ttl)?;
        if removed > 0 {
            self.metrics.record_pruned(removed);
            self.logger
                .record(&format!("pruned {} expired sightings", removed));
        }
        Ok(removed)
    }

    /// Registers the periodic analysis and cleanup services. A non-positive
    /// interval leaves the matching service out.
    pub fn start(self: &Arc<Self>, host: &mut ServiceHost) {
        match interval(self.config.analysis_interval) {
            Some(period) => {
                let tracker = Arc::clone(self);
                host.run_service("analysis", Some(period), move || {
                    let tracker = Arc::clone(&tracker);
                    async move {
                        tokio::task::spawn_blocking(move || tracker.analyze())
                            .await
                            .map_err(|err| TrackError::Service(format!("analysis task: {}", err)))?
                            .map(|_| ())
                    }
                });
            }
            None => self.logger.warn("periodic analysis disabled"),
        }

        match interval(self.config.cleanup_interval) {
            Some(period) => {
                let tracker = Arc::clone(self);
                host.run_service("cleanup", Some(period), move || {
                    let tracker = Arc::clone(&tracker);
                    async move {
                        tokio::task::spawn_blocking(move || tracker.cleanup())
                            .await
                            .map_err(|err| TrackError::Service(format!("cleanup task: {}", err)))?
                            .map(|_| ())
                    }
                });
            }
            None => self.logger.warn("periodic cleanup disabled"),
        }
    }
}

/// Period for a configured interval; `None` when it is not positive or does
/// not fit in a `Duration`.
fn interval(seconds: f64) -> Option<Duration> {
    if seconds > 0.0 {
        Duration::try_from_secs_f64(seconds).ok()
    } else {
        None
    }
}
