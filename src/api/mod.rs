//! Remote VPS API: transport, error decoding, wire types and operations.

pub mod client;
pub mod error;
pub mod models;
pub mod scalars;
mod vps;

pub use client::{ApiClient, ApiSettings};
pub use error::ApiError;
