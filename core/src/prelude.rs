use serde::{Deserialize, Serialize};

/// Default target speed used to seed new segments: 800 km/h in m/s.
pub const DEFAULT_SPEED: f64 = 800_000.0 / 3600.0;

/// When the EM driver stops iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StopCondition {
    /// Always run the configured number of iterations.
    #[default]
    Fixed,
    /// Stop as soon as an assignment round reproduces the previous one.
    UntilStable,
}

/// Shared configuration for analysis rounds and the periodic services.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub n_segments: usize,
    pub iterations: usize,
    pub stop: StopCondition,
    pub restarts: usize,
    /// Seconds between analysis rounds; non-positive disables the service.
    pub analysis_interval: f64,
    /// Seconds between store cleanups; non-positive disables the service.
    pub cleanup_interval: f64,
    /// Sightings older than this (relative to the newest one) are pruned.
    pub sighting_ttl: f64,
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_segments: 3,
            iterations: 10,
            stop: StopCondition::Fixed,
            restarts: 1,
            analysis_interval: 10.0,
            cleanup_interval: 60.0,
            sighting_ttl: 3600.0,
            seed: None,
        }
    }
}

/// Common error type for the tracking core.
#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("cannot estimate a segment from an empty cluster")]
    EmptyCluster,
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("no targets to assign sightings to")]
    NoTargets,
    #[error("numerical failure: {0}")]
    Numerical(String),
    #[error("store failure: {0}")]
    Store(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("service failure: {0}")]
    Service(String),
}

pub type TrackResult<T> = Result<T, TrackError>;
