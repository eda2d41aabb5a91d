pub mod sighting;
pub mod wire;

pub use sighting::Sighting;
pub use wire::TargetRecord;
