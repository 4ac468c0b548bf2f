//! Persistence for validated-location lists.
//!
//! Validation probes every location and is the slowest part of startup, so its
//! result is stored per network source and reused on the next run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::SimResult;
use crate::network::LocationId;

pub trait ValidLocationStore {
    /// Stored ids for `key`, or `None` when nothing was saved yet.
    fn load(&self, key: &str) -> SimResult<Option<Vec<LocationId>>>;
    fn save(&mut self, key: &str, ids: &[LocationId]) -> SimResult<()>;
}

/// One JSON array per network source at `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl ValidLocationStore for JsonFileStore {
    fn load(&self, key: &str) -> SimResult<Option<Vec<LocationId>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let ids: Vec<LocationId> = serde_json::from_str(&data)?;
        debug!("read {} validated ids from {}", ids.len(), path.display());
        Ok(Some(ids))
    }

    fn save(&mut self, key: &str, ids: &[LocationId]) -> SimResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        fs::write(&path, serde_json::to_string(ids)?)?;
        debug!("wrote {} validated ids to {}", ids.len(), path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<LocationId>>,
}

impl ValidLocationStore for MemoryStore {
    fn load(&self, key: &str) -> SimResult<Option<Vec<LocationId>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, ids: &[LocationId]) -> SimResult<()> {
        self.entries.insert(key.to_owned(), ids.to_vec());
        Ok(())
    }
}
