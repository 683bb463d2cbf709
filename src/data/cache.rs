use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::derive::enrich;
use super::loader::load_file;
use super::model::EnrichedDataset;
use crate::error::DataError;

/// Cheap identity of the source file's content: size plus modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFingerprint {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceFingerprint {
    pub fn of(path: &Path) -> Result<Self, DataError> {
        let meta = std::fs::metadata(path).map_err(|e| DataError::from_io(path, e))?;
        Ok(SourceFingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

/// Load-once snapshot of the enriched dataset.
///
/// Sessions share the snapshot through `Arc` and never mutate it. A new
/// snapshot replaces the old one only when the source changes on disk or
/// [`DatasetCache::invalidate`] is called.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    fingerprint: SourceFingerprint,
    snapshot: Arc<EnrichedDataset>,
}

impl DatasetCache {
    /// Read, parse and derive the source at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, DataError> {
        let path = path.into();
        let fingerprint = SourceFingerprint::of(&path)?;
        let snapshot = Arc::new(enrich(load_file(&path)?));
        log::info!(
            "Loaded {} records from {} ({} years, {} seasons)",
            snapshot.len(),
            path.display(),
            snapshot.years.len(),
            snapshot.seasons.len()
        );
        Ok(DatasetCache {
            path,
            fingerprint,
            snapshot,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<EnrichedDataset> {
        Arc::clone(&self.snapshot)
    }

    /// Reload if the source changed since the last load.
    ///
    /// Returns whether a new snapshot was installed. On error the previous
    /// snapshot stays in place.
    pub fn refresh(&mut self) -> Result<bool, DataError> {
        let current = SourceFingerprint::of(&self.path)?;
        if current == self.fingerprint {
            return Ok(false);
        }
        log::info!("Source {} changed, reloading", self.path.display());
        self.reload()?;
        Ok(true)
    }

    /// Drop the snapshot and reload unconditionally.
    pub fn invalidate(&mut self) -> Result<(), DataError> {
        log::info!("Cache invalidated for {}", self.path.display());
        self.reload()
    }

    fn reload(&mut self) -> Result<(), DataError> {
        let fresh = DatasetCache::load(self.path.clone())?;
        *self = fresh;
        Ok(())
    }
}
