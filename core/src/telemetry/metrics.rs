use std::sync::Mutex;

/// Counters describing the analysis service since start-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub rounds_completed: usize,
    pub rounds_failed: usize,
    pub targets_published: usize,
    pub sightings_pruned: usize,
}

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_round(&self, targets: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rounds_completed += 1;
            metrics.targets_published = targets;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rounds_failed += 1;
        }
    }

    pub fn record_pruned(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.sightings_pruned += count;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
