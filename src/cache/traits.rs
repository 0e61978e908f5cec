//! Core types for the caching system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A persisted cache record: the payload and when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  #[serde(rename = "ts")]
  pub timestamp: DateTime<Utc>,
  pub data: T,
}

impl<T> CacheEntry<T> {
  /// Create an entry stamped with the current time.
  pub fn now(data: T) -> Self {
    Self {
      timestamp: Utc::now(),
      data,
    }
  }

  /// An entry is fresh while `now - timestamp < ttl`.
  ///
  /// A zero TTL is never fresh, even for entries stamped in the future.
  pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
    if ttl.is_zero() {
      return false;
    }
    match (now - self.timestamp).to_std() {
      Ok(age) => age < ttl,
      // Written "in the future" (clock skew)
      Err(_) => true,
    }
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
  /// What happened when persisting the data
  pub write: CacheWrite,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T, write: CacheWrite) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
      write,
    }
  }

  /// Create a new cache result from a fresh cache entry.
  pub fn from_cache(entry: CacheEntry<T>) -> Self {
    Self {
      data: entry.data,
      source: CacheSource::CacheFresh,
      cached_at: Some(entry.timestamp),
      write: CacheWrite::Skipped,
    }
  }

  /// Create a new cache result for a call that skipped the cache entirely.
  pub fn bypassed(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Bypass,
      cached_at: None,
      write: CacheWrite::Skipped,
    }
  }
}

/// Indicates where returned data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fetched, cache consulted but missing or stale
  Network,
  /// Served from a fresh cache entry
  CacheFresh,
  /// Fetched without touching the cache (disabled or sentinel key)
  Bypass,
}

/// Outcome of a best-effort cache write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
  Written,
  /// Nothing was written (sentinel key, bypassed call or cache hit)
  Skipped,
  /// The write failed; the error was logged and swallowed
  Failed(String),
}

impl CacheWrite {
  pub fn is_failed(&self) -> bool {
    matches!(self, Self::Failed(_))
  }
}
