pub mod scene;
pub mod sightings;

pub use scene::Field;
pub use sightings::Simulator;
