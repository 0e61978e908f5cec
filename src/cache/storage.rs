//! Cache storage trait and file-per-key implementation.

use color_eyre::{eyre::eyre, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::key::CacheKey;
use super::traits::CacheEntry;

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  /// Read the entry stored under `key`, `Ok(None)` if there is none.
  fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<CacheEntry<T>>>;

  /// Replace the entry stored under `key`.
  fn write<T: Serialize>(&self, key: &CacheKey, entry: &CacheEntry<T>) -> Result<()>;
}

/// Stores each entry as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  /// Storage under the platform user cache directory.
  pub fn open() -> Result<Self> {
    Ok(Self::new(Self::default_dir()?))
  }

  /// `$XDG_CACHE_HOME/oh` (or the platform equivalent).
  pub fn default_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
      .ok_or_else(|| eyre!("Could not determine cache directory"))?;

    Ok(cache_dir.join("oh"))
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  fn entry_path(&self, key: &CacheKey) -> PathBuf {
    self.dir.join(format!("{}.json", key))
  }
}

impl CacheStorage for FileStorage {
  fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<CacheEntry<T>>> {
    let path = self.entry_path(key);
    let bytes = match std::fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(eyre!("Failed to read cache entry {}: {}", path.display(), e)),
    };

    let entry = serde_json::from_slice(&bytes)
      .map_err(|e| eyre!("Failed to parse cache entry {}: {}", path.display(), e))?;

    Ok(Some(entry))
  }

  fn write<T: Serialize>(&self, key: &CacheKey, entry: &CacheEntry<T>) -> Result<()> {
    std::fs::create_dir_all(&self.dir).map_err(|e| {
      eyre!(
        "Failed to create cache directory {}: {}",
        self.dir.display(),
        e
      )
    })?;

    let bytes =
      serde_json::to_vec(entry).map_err(|e| eyre!("Failed to serialize cache entry: {}", e))?;

    let path = self.entry_path(key);
    std::fs::write(&path, bytes)
      .map_err(|e| eyre!("Failed to write cache entry {}: {}", path.display(), e))?;

    Ok(())
  }
}
