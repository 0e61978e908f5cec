use std::borrow::Cow;
use std::fmt;

/// Opaque identifier of a cache entry.
///
/// The empty key is the "never cache" sentinel ([`CacheKey::NONE`]). Results
/// fetched under it are never written to or read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CacheKey(Cow<'static, str>);

impl CacheKey {
  /// Sentinel meaning "do not persist this result".
  pub const NONE: CacheKey = CacheKey::from_static("");

  pub const CLOUD_SERVERS: CacheKey = CacheKey::from_static("cloud_servers");
  pub const VPS_IMAGES: CacheKey = CacheKey::from_static("vps_images");
  pub const VPS_PRODUCTS: CacheKey = CacheKey::from_static("vps_products");
  pub const FLAVOURS: CacheKey = CacheKey::from_static("flavours");
  pub const ATTACHED_NETWORKS: CacheKey = CacheKey::from_static("attached_networks");
  pub const VIRTUAL_NETWORKS: CacheKey = CacheKey::from_static("virtual_networks");

  pub const fn from_static(key: &'static str) -> Self {
    Self(Cow::Borrowed(key))
  }

  pub fn new(key: impl Into<String>) -> Self {
    Self(Cow::Owned(key.into()))
  }

  /// True for the "never cache" sentinel.
  pub fn is_none(&self) -> bool {
    self.0.is_empty()
  }

  /// Derive a key by appending `_<arg>`.
  ///
  /// Arguments with equal string forms produce the same key.
  pub fn with_arg(&self, arg: impl fmt::Display) -> Self {
    Self::new(format!("{}_{}", self.0, arg))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}
