use crate::generator::sightings::DEFAULT_BEARING_NOISE;
use crate::generator::Field;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use trackcore::prelude::AnalysisConfig;
use trackcore::TargetRecord;

/// Scenario and analysis settings for one simulator run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub seed: Option<u64>,
    /// Observer detection radius in meters.
    pub radius: f64,
    /// Maximum distance (meters) observers are scattered from a path.
    pub observer_jitter: f64,
    pub observers_per_segment: usize,
    /// Extra observers placed uniformly inside the field.
    pub field_observers: usize,
    pub bearing_noise: f64,
    pub field: Field,
    pub targets: Vec<TargetRecord>,
    /// Additional ground-truth targets drawn inside the field.
    pub random_targets: usize,
    pub waypoints: usize,
    pub analysis: AnalysisConfig,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            seed: None,
            radius: 5_000.0,
            observer_jitter: 2_500.0,
            observers_per_segment: 10,
            field_observers: 0,
            bearing_noise: DEFAULT_BEARING_NOISE,
            field: Field::default(),
            targets: vec![reference_target()],
            random_targets: 0,
            waypoints: 4,
            analysis: AnalysisConfig::default(),
        }
    }
}

/// Four-waypoint flight path used when no targets are configured.
pub fn reference_target() -> TargetRecord {
    TargetRecord {
        start_time: 0.0,
        speed: trackcore::prelude::DEFAULT_SPEED,
        path: vec![
            [45.361285195897885, 33.90794799044153],
            [47.487079766379715, 33.081535775384715],
            [49.47728424495352, 27.901909920451157],
            [49.83269083681804, 24.09401307480089],
        ],
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(
        seed: Option<u64>,
        radius: f64,
        observers_per_segment: usize,
        bearing_noise: f64,
        analysis: AnalysisConfig,
    ) -> Self {
        Self {
            seed,
            radius,
            observer_jitter: radius / 2.0,
            observers_per_segment,
            bearing_noise,
            analysis: AnalysisConfig { seed, ..analysis },
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use trackcore::StopCondition;

    #[test]
    fn config_from_args_carries_the_seed_into_analysis() {
        let cfg = WorkflowConfig::from_args(
            Some(7),
            4_000.0,
            6,
            0.1,
            AnalysisConfig {
                n_segments: 2,
                ..Default::default()
            },
        );
        assert_eq!(cfg.analysis.seed, Some(7));
        assert_eq!(cfg.analysis.n_segments, 2);
        assert_eq!(cfg.observer_jitter, 2_000.0);
        assert_eq!(cfg.targets, vec![reference_target()]);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"seed: 3\nradius: 2500.0\nobservers_per_segment: 4\n\
              targets:\n  - start_time: 10.0\n    speed: 200.0\n    path: [[48.6, 32.8], [49.2, 33.7]]\n\
              analysis:\n  n_segments: 1\n  stop: until_stable\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();

        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.radius, 2_500.0);
        assert_eq!(cfg.observers_per_segment, 4);
        assert_eq!(cfg.targets.len(), 1);
        assert_eq!(cfg.targets[0].path[1], [49.2, 33.7]);
        assert_eq!(cfg.analysis.n_segments, 1);
        assert_eq!(cfg.analysis.stop, StopCondition::UntilStable);
        // untouched fields keep their defaults
        assert_eq!(cfg.analysis.iterations, 10);
        assert_eq!(cfg.bearing_noise, DEFAULT_BEARING_NOISE);
    }

    #[test]
    fn config_load_reports_missing_file() {
        let err = WorkflowConfig::load("/nonexistent/workflow.yaml").unwrap_err();
        assert!(err.to_string().contains("reading workflow config"));
    }
}
