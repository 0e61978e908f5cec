//! On-disk result cache with TTL based freshness.
//!
//! Two independent entry points are provided:
//! - [`CacheLayer::call`] wraps a fetch with read-through caching
//! - [`CacheLayer::store`] unconditionally overwrites an entry (write-through)
//!
//! Entries live one per key as `{"ts": <RFC3339>, "data": <T>}` JSON files.
//! There is no in-memory layer and no locking; concurrent writers race and
//! the last one wins.

mod key;
mod layer;
mod storage;
mod traits;

pub use key::CacheKey;
pub use layer::{CacheLayer, DEFAULT_TTL};
pub use storage::{CacheStorage, FileStorage};
pub use traits::{CacheEntry, CacheResult, CacheSource, CacheWrite};
