pub mod scheduler;
pub mod tracker;

pub use scheduler::{ServiceHost, ShutdownSignal};
pub use tracker::Tracker;
