use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LedgerStore, StoreResult};
use crate::error::StoreError;

const SNAPSHOT_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u8,
    /// key -> hex-encoded value
    entries: BTreeMap<String, String>,
}

/// Store persisted as a single JSON file.
///
/// Nothing is cached: each `get` re-reads the file and each mutation
/// rewrites it through a temporary file followed by a rename.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded view of every key currently on disk.
    pub fn entries(&self) -> StoreResult<BTreeMap<String, Vec<u8>>> {
        self.load()?
            .entries
            .into_iter()
            .map(|(key, value)| {
                hex::decode(&value)
                    .map(|bytes| (key.clone(), bytes))
                    .map_err(|e| StoreError::Serialization(format!("value of {key}: {e}")))
            })
            .collect()
    }

    fn load(&self) -> StoreResult<Snapshot> {
        if !self.path.exists() {
            return Ok(Snapshot {
                version: SNAPSHOT_VERSION,
                entries: BTreeMap::new(),
            });
        }
        let data = fs::read(&self.path)?;
        let snap: Snapshot = serde_json::from_slice(&data)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", self.path.display())))?;
        if snap.version != SNAPSHOT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported snapshot version {}",
                snap.version
            )));
        }
        Ok(snap)
    }

    fn save(&self, snap: &Snapshot) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(snap)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), keys = snap.entries.len(), "snapshot saved");
        Ok(())
    }
}

impl LedgerStore for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        match self.load()?.entries.get(key) {
            Some(value) => hex::decode(value)
                .map(Some)
                .map_err(|e| StoreError::Serialization(format!("value of {key}: {e}"))),
            None => Ok(None),
        }
    }

    fn put(&mut self, key: &str, value: &[u8]) -> StoreResult<()> {
        let mut snap = self.load()?;
        snap.entries.insert(key.to_string(), hex::encode(value));
        self.save(&snap)
    }

    fn delete(&mut self, key: &str) -> StoreResult<()> {
        let mut snap = self.load()?;
        if snap.entries.remove(key).is_none() {
            return Ok(());
        }
        self.save(&snap)
    }
}
