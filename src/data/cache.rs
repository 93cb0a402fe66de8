use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;

use super::loader::load_file;
use super::model::DisasterDataset;

// ---------------------------------------------------------------------------
// Memoized dataset loads
// ---------------------------------------------------------------------------

/// Process-lifetime memo of loaded datasets, keyed by canonical path.
///
/// Source files are static while the dashboard runs, so entries are never
/// invalidated. Failed loads are not remembered; the next call retries.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Arc<DisasterDataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dataset for `path`, reading the file only on first use.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<DisasterDataset>> {
        let key = cache_key(path);

        if let Some(hit) = self.lock().get(&key) {
            log::debug!("Dataset cache hit for {}", key.display());
            return Ok(Arc::clone(hit));
        }

        let dataset = Arc::new(load_file(path)?);
        self.lock().insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Number of memoized datasets.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<DisasterDataset>>> {
        // The map holds only finished loads, so a poisoned guard is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `a.csv` and `./a.csv` must share one entry.
fn cache_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
