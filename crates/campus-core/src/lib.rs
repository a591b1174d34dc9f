//! Core library for campus-dash.
//!
//! Data access for the campus administration dashboard: a REST client,
//! a TTL cache that coalesces concurrent fetches, a local fallback store
//! used while the API is unreachable, per-resource service façades that tie
//! them together, and a live-update notification feed.

pub mod api;
pub mod cache;
pub mod config;
pub mod fallback;
pub mod live;
pub mod models;
pub mod services;

pub use api::{ApiClient, ApiError};
pub use cache::{CacheError, ResourceCache};
pub use config::Config;
pub use fallback::{FallbackStore, FileStore, KeyValueStore, MemoryStore, StoreError};
pub use live::{LiveChannel, NotificationMessage, Transport};
pub use models::{Collection, Event, FoundItem, LostItem, Notice, Resource, ResourceKind, User};
pub use services::{CampusServices, DashboardSummary, ResourceService, ServiceError};
