use log::{error, info, warn};
use std::fmt::Display;
use std::time::Duration;

/// Reports analysis and service events under a fixed component name.
pub struct LogManager {
    component: &'static str,
}

impl LogManager {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }

    pub fn record(&self, message: &str) {
        info!("[{}] {}", self.component, message);
    }

    pub fn round_published(&self, sightings: usize, targets: usize, elapsed: Duration) {
        info!(
            "[{}] analysis round over {} sightings published {} targets in {:.1} ms",
            self.component,
            sightings,
            targets,
            elapsed.as_secs_f64() * 1000.0
        );
    }

    pub fn round_failed(&self, reason: &dyn Display) {
        error!(
            "[{}] analysis round failed, keeping previous targets: {}",
            self.component, reason
        );
    }

    pub fn warn(&self, message: &str) {
        warn!("[{}] {}", self.component, message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("trackcore")
    }
}
