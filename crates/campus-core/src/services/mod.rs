//! Per-resource service façades.
//!
//! Each façade reads through the shared `ResourceCache`, falls back to the
//! `FallbackStore` when the remote API is unavailable, and invalidates its
//! cache key after every write so the next read sees the change.

pub mod campus;
pub mod resource;

pub use campus::{CampusServices, DashboardSummary};
pub use resource::ResourceService;

use thiserror::Error;

use crate::api::ApiError;
use crate::cache::CacheError;
use crate::fallback::StoreError;
use crate::models::ResourceKind;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Remote API failed: {0}")]
    Remote(#[from] ApiError),

    #[error("Fallback store failed: {0}")]
    Fallback(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Cached collection does not hold {0}")]
    CollectionMismatch(ResourceKind),
}
