pub mod geo;
pub mod matrix;
pub mod stats;

pub use geo::GeoPoint;
pub use matrix::MatrixHelper;
pub use stats::StatsHelper;
