//! Trajectory-reconstruction core for bearing-only sighting fusion.
//!
//! Sightings are clustered into straight, constant-speed segments by
//! expectation-maximization. The periodic service layer re-runs the analysis
//! against the full sighting store and publishes the resulting targets.

pub mod analysis;
pub mod interface;
pub mod math;
pub mod model;
pub mod prelude;
pub mod service;
pub mod store;
pub mod telemetry;

pub use interface::{Sighting, TargetRecord};
pub use math::GeoPoint;
pub use model::Target;
pub use prelude::{AnalysisConfig, StopCondition, TrackError, TrackResult};
