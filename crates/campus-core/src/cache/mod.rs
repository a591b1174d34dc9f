//! In-memory resource cache with request coalescing.
//!
//! This module provides `ResourceCache`, which sits between the service
//! façades and their fetchers:
//! - Values are fresh for a fixed TTL (30 seconds by default)
//! - Concurrent requests for the same key share one in-flight fetch
//! - Failed fetches are never cached
//! - A background sweeper drops entries nobody has asked for recently

mod entry;
pub mod manager;

pub use manager::{CacheError, ResourceCache, DEFAULT_SWEEP_INTERVAL, DEFAULT_TTL};
