//! Cached client for a VPS hosting API.
//!
//! - [`api`]: authenticated JSON transport, error decoding, lenient wire scalars
//! - [`cache`]: on-disk TTL cache used for read-through and write-through
//! - [`config`]: configuration file and environment overrides

pub mod api;
pub mod cache;
pub mod config;
