use crate::interface::Sighting;
use crate::prelude::{TrackError, TrackResult};
use crate::store::SightingStore;
use log::debug;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Durable store keeping one JSON-encoded sighting per line.
///
/// The whole log is loaded on open and mirrored in memory; appends go to the
/// end of the file, pruning rewrites it through a temporary sibling.
pub struct FileStore {
    path: PathBuf,
    cache: Mutex<Vec<Sighting>>,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> TrackResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut sightings = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                sightings.push(serde_json::from_str(&line)?);
            }
        }
        debug!(
            "opened sighting log {} with {} entries",
            path.display(),
            sightings.len()
        );

        Ok(Self {
            path,
            cache: Mutex::new(sightings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> TrackResult<MutexGuard<'_, Vec<Sighting>>> {
        self.cache
            .lock()
            .map_err(|_| TrackError::Store("file store lock poisoned".into()))
    }

    fn rewrite(&self, sightings: &[Sighting]) -> TrackResult<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for s in sightings {
                serde_json::to_writer(&mut writer, s)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SightingStore for FileStore {
    fn add_sighting(&self, sighting: Sighting) -> TrackResult<Sighting> {
        let mut cache = self.guard()?;
        let mut line = serde_json::to_vec(&sighting)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        cache.push(sighting);
        Ok(sighting)
    }

    fn list_sightings(&self) -> TrackResult<Vec<Sighting>> {
        Ok(self.guard()?.clone())
    }

    fn clear_sightings(&self) -> TrackResult<()> {
        let mut cache = self.guard()?;
        File::create(&self.path)?;
        cache.clear();
        Ok(())
    }

    fn remove_before(&self, cutoff: f64) -> TrackResult<usize> {
        let mut cache = self.guard()?;
        let kept: Vec<Sighting> = cache
            .iter()
            .copied()
            .filter(|s| s.timestamp >= cutoff)
            .collect();
        let removed = cache.len() - kept.len();
        if removed > 0 {
            self.rewrite(&kept)?;
            *cache = kept;
        }
        Ok(removed)
    }
}
