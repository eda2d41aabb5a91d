use crate::interface::Sighting;
use crate::prelude::{TrackError, TrackResult};
use crate::store::SightingStore;
use std::sync::{Mutex, MutexGuard};

/// Volatile store used by tests and the simulator replay.
#[derive(Default)]
pub struct MemoryStore {
    sightings: Mutex<Vec<Sighting>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sightings(sightings: Vec<Sighting>) -> Self {
        Self {
            sightings: Mutex::new(sightings),
        }
    }

    fn guard(&self) -> TrackResult<MutexGuard<'_, Vec<Sighting>>> {
        self.sightings
            .lock()
            .map_err(|_| TrackError::Store("memory store lock poisoned".into()))
    }
}

impl SightingStore for MemoryStore {
    fn add_sighting(&self, sighting: Sighting) -> TrackResult<Sighting> {
        self.guard()?.push(sighting);
        Ok(sighting)
    }

    fn list_sightings(&self) -> TrackResult<Vec<Sighting>> {
        Ok(self.guard()?.clone())
    }

    fn clear_sightings(&self) -> TrackResult<()> {
        self.guard()?.clear();
        Ok(())
    }

    fn remove_before(&self, cutoff: f64) -> TrackResult<usize> {
        let mut sightings = self.guard()?;
        let before = sightings.len();
        sightings.retain(|s| s.timestamp >= cutoff);
        Ok(before - sightings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_lists_in_insertion_order() {
        let store = MemoryStore::new();
        let items = [
            Sighting::new(1234.0, 1.0, 2.0, 0.1),
            Sighting::new(2345.0, 2.0, 3.0, 0.2),
        ];
        for s in items {
            assert_eq!(store.add_sighting(s).unwrap(), s);
        }
        assert_eq!(store.list_sightings().unwrap(), items.to_vec());

        store.clear_sightings().unwrap();
        assert!(store.list_sightings().unwrap().is_empty());
    }

    #[test]
    fn removes_old_sightings() {
        let store = MemoryStore::with_sightings(vec![
            Sighting::new(10.0, 0.0, 0.0, 0.0),
            Sighting::new(20.0, 0.0, 0.0, 0.0),
            Sighting::new(30.0, 0.0, 0.0, 0.0),
        ]);
        assert_eq!(store.remove_before(20.0).unwrap(), 1);
        let left: Vec<f64> = store
            .list_sightings()
            .unwrap()
            .iter()
            .map(|s| s.timestamp)
            .collect();
        assert_eq!(left, vec![20.0, 30.0]);
    }
}
