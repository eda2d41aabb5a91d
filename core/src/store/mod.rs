//! Sighting persistence behind a narrow append/list contract.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::interface::Sighting;
use crate::prelude::TrackResult;

/// Append-only collection of sightings that analysis rounds read in full.
pub trait SightingStore: Send + Sync {
    fn add_sighting(&self, sighting: Sighting) -> TrackResult<Sighting>;
    fn list_sightings(&self) -> TrackResult<Vec<Sighting>>;
    fn clear_sightings(&self) -> TrackResult<()>;
    /// Drops every sighting with `timestamp < cutoff`, returning how many went.
    fn remove_before(&self, cutoff: f64) -> TrackResult<usize>;
}
