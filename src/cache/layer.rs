//! Cache layer that wraps fetches with TTL based read-through caching.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::key::CacheKey;
use super::storage::{CacheStorage, FileStorage};
use super::traits::{CacheEntry, CacheResult, CacheWrite};

/// How long a cached entry is considered fresh unless a caller says otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache layer over a storage backend.
///
/// `disabled` mirrors the global "no cache" switch: [`CacheLayer::call`]
/// then skips storage entirely.
pub struct CacheLayer<S: CacheStorage = FileStorage> {
  storage: Arc<S>,
  disabled: bool,
}

impl<S: CacheStorage> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: S, disabled: bool) -> Self {
    Self {
      storage: Arc::new(storage),
      disabled,
    }
  }

  pub fn is_disabled(&self) -> bool {
    self.disabled
  }

  /// Fetch with read-through caching.
  ///
  /// 1. Disabled cache or sentinel key: call `fetch`, no disk access
  /// 2. Fresh entry under `key`: return it without calling `fetch`
  /// 3. Otherwise call `fetch`; on success persist it (best-effort)
  ///
  /// Unreadable or corrupt entries count as a miss. Fetch errors are returned
  /// as is and nothing is written.
  pub async fn call<T, E, F, Fut>(
    &self,
    key: &CacheKey,
    ttl: Duration,
    fetch: F,
  ) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if self.disabled || key.is_none() {
      return fetch().await.map(CacheResult::bypassed);
    }

    match self.storage.read::<T>(key) {
      Ok(Some(entry)) if entry.is_fresh(ttl, Utc::now()) => {
        debug!(%key, cached_at = %entry.timestamp, "cache hit");
        return Ok(CacheResult::from_cache(entry));
      }
      Ok(Some(entry)) => debug!(%key, cached_at = %entry.timestamp, "cache entry is stale"),
      Ok(None) => debug!(%key, "cache miss"),
      Err(e) => debug!(%key, error = %e, "unreadable cache entry, treating as miss"),
    }

    let data = fetch().await?;
    let write = self.write_entry(key, &data);
    Ok(CacheResult::from_network(data, write))
  }

  /// Unconditionally overwrite the entry under `key` with a fresh timestamp.
  ///
  /// The sentinel key is never written. Failures are logged and returned as
  /// [`CacheWrite::Failed`], never as an error.
  pub fn store<T: Serialize>(&self, key: &CacheKey, data: &T) -> CacheWrite {
    if key.is_none() {
      return CacheWrite::Skipped;
    }
    self.write_entry(key, data)
  }

  fn write_entry<T: Serialize>(&self, key: &CacheKey, data: &T) -> CacheWrite {
    match self.storage.write(key, &CacheEntry::now(data)) {
      Ok(()) => {
        debug!(%key, "cache entry written");
        CacheWrite::Written
      }
      Err(e) => {
        warn!(%key, error = %e, "failed to write cache entry");
        CacheWrite::Failed(e.to_string())
      }
    }
  }
}

impl<S: CacheStorage> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      disabled: self.disabled,
    }
  }
}
