//! Offline fallback store for when the campus API is unreachable.
//!
//! This module provides the `FallbackStore`, a locally persisted copy of
//! every resource collection. Snapshots are seeded from built-in campus data
//! the first time they are needed and afterwards accept new records, so the
//! dashboard stays usable (and demo-able) without a backend.
//!
//! Snapshots are JSON arrays stored under fixed keys:
//! - `campus_notices`, `campus_events`
//! - `campus_lost_items`, `campus_found_items`
//! - `campus_users`
//!
//! The store assumes a single writer. Two processes sharing one data
//! directory can overwrite each other's inserts.

pub mod error;
pub mod seed;
pub mod storage;
pub mod store;

pub use error::StoreError;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::FallbackStore;
