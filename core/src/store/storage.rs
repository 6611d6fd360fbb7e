// ranmix/src/store/storage.rs

//! Key/value durable storage backends, the local-storage analogue for persisted stores.

use crate::error::{RanmixError, RanmixResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Synchronous string storage keyed by a well-known name.
///
/// Implementations must be cheap enough to call while a store holds its state lock.
pub trait StorageBackend: Send + Sync {
  /// `Ok(None)` when nothing has been stored under `key`.
  fn read(&self, key: &str) -> RanmixResult<Option<String>>;
  fn write(&self, key: &str, value: &str) -> RanmixResult<()>;
  fn remove(&self, key: &str) -> RanmixResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pre-populates a key, e.g. to simulate data left by a previous session.
  pub fn with_entry(self, key: &str, value: &str) -> Self {
    self.entries.lock().insert(key.to_string(), value.to_string());
    self
  }
}

impl StorageBackend for MemoryStorage {
  fn read(&self, key: &str) -> RanmixResult<Option<String>> {
    Ok(self.entries.lock().get(key).cloned())
  }

  fn write(&self, key: &str, value: &str) -> RanmixResult<()> {
    self.entries.lock().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> RanmixResult<()> {
    self.entries.lock().remove(key);
    Ok(())
  }
}

/// One `<key>.json` file per key inside `dir`. Writes land in a sibling temp file first and are
/// renamed into place, so a crash mid-write leaves the previous value readable.
#[derive(Debug, Clone)]
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  pub fn open(dir: impl AsRef<Path>) -> RanmixResult<Self> {
    let dir = dir.as_ref().to_path_buf();
    fs::create_dir_all(&dir).map_err(|e| RanmixError::Persistence {
      key: dir.display().to_string(),
      reason: format!("cannot create storage directory: {}", e),
    })?;
    Ok(Self { dir })
  }

  fn path_for(&self, key: &str) -> PathBuf {
    let safe: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
      .collect();
    self.dir.join(format!("{}.json", safe))
  }
}

fn persistence_err(key: &str, e: std::io::Error) -> RanmixError {
  RanmixError::Persistence {
    key: key.to_string(),
    reason: e.to_string(),
  }
}

impl StorageBackend for FileStorage {
  fn read(&self, key: &str) -> RanmixResult<Option<String>> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(contents) => Ok(Some(contents)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(persistence_err(key, e)),
    }
  }

  fn write(&self, key: &str, value: &str) -> RanmixResult<()> {
    let target = self.path_for(key);
    let tmp = target.with_extension("json.tmp");
    fs::write(&tmp, value).map_err(|e| persistence_err(key, e))?;
    fs::rename(&tmp, &target).map_err(|e| persistence_err(key, e))
  }

  fn remove(&self, key: &str) -> RanmixResult<()> {
    match fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(persistence_err(key, e)),
    }
  }
}
