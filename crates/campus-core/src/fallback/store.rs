use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};

use crate::models::{Collection, Event, FoundItem, LostItem, Notice, Resource, ResourceKind, User};

use super::seed::seed_json;
use super::{KeyValueStore, StoreError};

/// Locally persisted copy of every resource collection.
///
/// Records are kept most recent first. Clone is cheap; clones share the
/// same storage and write lock.
pub struct FallbackStore<S> {
    storage: Arc<S>,
    // Serializes read-modify-write cycles within this process.
    write_lock: Arc<Mutex<()>>,
}

impl<S> Clone for FallbackStore<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<S: KeyValueStore> FallbackStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage: Arc::new(storage),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Write the seed dataset under every key that has never been written.
    ///
    /// Keys that already hold a snapshot (even an empty one) are left alone,
    /// so calling this repeatedly never overwrites inserted records.
    pub fn init(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        for kind in ResourceKind::ALL {
            let key = kind.storage_key();
            if self.storage.get(key)?.is_some() {
                continue;
            }
            self.storage.set(key, &seed_json(kind)?)?;
            info!(key = key, "Seeded fallback snapshot");
        }
        Ok(())
    }

    /// Whether a snapshot exists for `kind`.
    pub fn is_seeded(&self, kind: ResourceKind) -> Result<bool, StoreError> {
        Ok(self.storage.get(kind.storage_key())?.is_some())
    }

    /// The stored snapshot for `R`, or an empty list if none was written.
    pub fn list<R: Resource>(&self) -> Result<Vec<R>, StoreError> {
        let key = R::KIND.storage_key();
        match self.storage.get(key)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    /// The stored snapshot for `kind`, tagged by record type.
    pub fn list_kind(&self, kind: ResourceKind) -> Result<Collection, StoreError> {
        Ok(match kind {
            ResourceKind::Notices => Notice::into_collection(self.list()?),
            ResourceKind::Events => Event::into_collection(self.list()?),
            ResourceKind::LostItems => LostItem::into_collection(self.list()?),
            ResourceKind::FoundItems => FoundItem::into_collection(self.list()?),
            ResourceKind::Users => User::into_collection(self.list()?),
        })
    }

    /// Stamp `draft` with a fresh id, timestamp and attribution, store it at
    /// the front of its collection and return the stored record.
    ///
    /// On error nothing is written.
    pub fn insert<R: Resource>(&self, mut draft: R) -> Result<R, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut items: Vec<R> = self.list()?;
        let now = Utc::now();
        let id = next_id(now.timestamp_millis(), &items);
        draft.stamp(id, now);

        items.insert(0, draft.clone());
        let json = serde_json::to_string(&items).map_err(StoreError::Encode)?;
        self.storage.set(R::KIND.storage_key(), &json)?;

        debug!(kind = %R::KIND, id = id, "Stored record in fallback snapshot");
        Ok(draft)
    }
}

/// Millisecond clock ids, bumped past any existing id so rapid inserts
/// never collide.
fn next_id<R: Resource>(now_ms: i64, existing: &[R]) -> i64 {
    let max_existing = existing.iter().filter_map(|item| item.id()).max();
    match max_existing {
        Some(max) if max >= now_ms => max + 1,
        _ => now_ms,
    }
}
