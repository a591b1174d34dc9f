use std::marker::PhantomData;

use chrono::Utc;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::cache::ResourceCache;
use crate::fallback::{FallbackStore, KeyValueStore, StoreError};
use crate::models::{contains_ignore_case, Collection, Editable, Event, Notice, Resource};

use super::ServiceError;

/// Read/write access to one record type.
///
/// Reads go through the shared cache and never fail because the remote API
/// is down; they fail only if the fallback store itself does. Clone is
/// cheap.
pub struct ResourceService<R, S> {
    api: ApiClient,
    cache: ResourceCache<Collection>,
    store: FallbackStore<S>,
    _record: PhantomData<fn() -> R>,
}

impl<R, S> Clone for ResourceService<R, S> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
            store: self.store.clone(),
            _record: PhantomData,
        }
    }
}

impl<R: Resource, S: KeyValueStore> ResourceService<R, S> {
    pub fn new(api: ApiClient, cache: ResourceCache<Collection>, store: FallbackStore<S>) -> Self {
        Self {
            api,
            cache,
            store,
            _record: PhantomData,
        }
    }

    /// The whole collection, from the cache, the remote API or the fallback
    /// snapshot, in that order of preference.
    pub async fn fetch_all(&self) -> Result<Vec<R>, ServiceError> {
        let api = self.api.clone();
        let store = self.store.clone();

        let collection = self
            .cache
            .get(R::KIND.cache_key(), move || async move {
                let items = match api.list::<R>().await {
                    Ok(items) => {
                        info!(kind = %R::KIND, count = items.len(), "Fetched from remote API");
                        items
                    }
                    Err(e) => {
                        warn!(kind = %R::KIND, error = %e, "Remote fetch failed, using fallback snapshot");
                        store.init()?;
                        store.list::<R>()?
                    }
                };
                Ok::<_, StoreError>(R::into_collection(items))
            })
            .await?;

        R::from_collection(collection).ok_or(ServiceError::CollectionMismatch(R::KIND))
    }

    /// Create a record remotely, or in the fallback store if the remote call
    /// fails. Either way the cached collection is invalidated.
    ///
    /// Fails only when both paths fail; the fallback error is returned.
    pub async fn create(&self, draft: R, actor_id: i64) -> Result<R, ServiceError> {
        let result = match self.api.create(&draft, actor_id).await {
            Ok(created) => {
                info!(kind = %R::KIND, id = ?created.id(), "Created record remotely");
                Ok(created)
            }
            Err(e) => {
                warn!(kind = %R::KIND, error = %e, "Remote create failed, storing locally");
                self.store
                    .init()
                    .and_then(|()| self.store.insert(draft))
                    .map_err(ServiceError::Fallback)
            }
        };

        self.cache.clear(R::KIND.cache_key());
        result
    }

    /// Filtered remote read, applying `keep` to the fallback snapshot when
    /// the remote API is unavailable. Results are not cached.
    async fn filtered<P>(
        &self,
        suffix: &str,
        query: &[(&str, String)],
        keep: P,
    ) -> Result<Vec<R>, ServiceError>
    where
        P: Fn(&R) -> bool,
    {
        match self.api.list_filtered::<R>(suffix, query).await {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(kind = %R::KIND, filter = suffix, error = %e, "Remote filter failed, filtering fallback snapshot");
                self.store.init()?;
                let items = self.store.list::<R>()?;
                Ok(items.into_iter().filter(|item| keep(item)).collect())
            }
        }
    }
}

impl<R: Editable, S: KeyValueStore> ResourceService<R, S> {
    /// A single record, or `None` if neither the remote API nor the fallback
    /// snapshot knows it.
    pub async fn fetch_one(&self, id: i64) -> Result<Option<R>, ServiceError> {
        match self.api.fetch::<R>(id).await {
            Ok(record) => Ok(Some(record)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => {
                warn!(kind = %R::KIND, id = id, error = %e, "Remote lookup failed, searching fallback snapshot");
                self.store.init()?;
                let items = self.store.list::<R>()?;
                Ok(items.into_iter().find(|item| item.id() == Some(id)))
            }
        }
    }

    /// Replace a record. Remote only; there is no offline edit path.
    pub async fn update(&self, id: i64, record: R, actor_id: i64) -> Result<R, ServiceError> {
        let updated = self.api.update(id, &record, actor_id).await?;
        self.cache.clear(R::KIND.cache_key());
        Ok(updated)
    }

    /// Delete a record. Remote only; there is no offline delete path.
    pub async fn delete(&self, id: i64, actor_id: i64) -> Result<(), ServiceError> {
        self.api.delete_record(R::KIND, id, actor_id).await?;
        self.cache.clear(R::KIND.cache_key());
        Ok(())
    }

    /// Records whose title or description contains `keyword`.
    pub async fn search(&self, keyword: &str) -> Result<Vec<R>, ServiceError> {
        let query = [("keyword", keyword.to_string())];
        self.filtered("/search", &query, |item| item.matches_keyword(keyword))
            .await
    }

    pub async fn by_status(&self, status: &str) -> Result<Vec<R>, ServiceError> {
        let suffix = format!("/status/{}", status);
        self.filtered(&suffix, &[], |item| item.status().eq_ignore_ascii_case(status))
            .await
    }

    /// Records posted by the account `user_id`.
    pub async fn by_user(&self, user_id: i64) -> Result<Vec<R>, ServiceError> {
        let suffix = format!("/user/{}", user_id);
        self.filtered(&suffix, &[], |item| item.posted_by_id() == Some(user_id))
            .await
    }
}

impl<S: KeyValueStore> ResourceService<Event, S> {
    /// Active events dated today or later.
    pub async fn upcoming(&self) -> Result<Vec<Event>, ServiceError> {
        let today = Utc::now().date_naive();
        self.filtered("/upcoming", &[], |event| event.is_upcoming(today))
            .await
    }

    pub async fn by_location(&self, location: &str) -> Result<Vec<Event>, ServiceError> {
        let query = [("location", location.to_string())];
        self.filtered("/location", &query, |event| {
            contains_ignore_case(&event.location, location)
        })
        .await
    }
}

impl<S: KeyValueStore> ResourceService<Notice, S> {
    pub async fn active(&self) -> Result<Vec<Notice>, ServiceError> {
        self.filtered("/active", &[], Notice::is_active).await
    }

    pub async fn by_category(&self, category: &str) -> Result<Vec<Notice>, ServiceError> {
        let suffix = format!("/category/{}", category);
        self.filtered(&suffix, &[], |notice| notice.category.eq_ignore_ascii_case(category))
            .await
    }

    pub async fn by_priority(&self, priority: &str) -> Result<Vec<Notice>, ServiceError> {
        let suffix = format!("/priority/{}", priority);
        self.filtered(&suffix, &[], |notice| notice.priority.eq_ignore_ascii_case(priority))
            .await
    }

    /// Active notices with HIGH priority.
    pub async fn high_priority(&self) -> Result<Vec<Notice>, ServiceError> {
        self.filtered("/high-priority", &[], |notice| {
            notice.is_active() && notice.is_high_priority()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::fallback::{seed, MemoryStore};
    use crate::models::{FoundItem, User};

    // Nothing listens on the discard port, so every remote call fails fast.
    fn offline<R: Resource>(store: &FallbackStore<MemoryStore>) -> ResourceService<R, MemoryStore> {
        let api = ApiClient::new("http://127.0.0.1:9/api", Duration::from_secs(2)).unwrap();
        ResourceService::new(api, ResourceCache::default(), store.clone())
    }

    #[tokio::test]
    async fn test_fetch_all_offline_serves_seed() {
        let store = FallbackStore::new(MemoryStore::new());
        let events = offline::<Event>(&store).fetch_all().await.unwrap();

        assert_eq!(events, seed::events());
        assert!(store.is_seeded(crate::models::ResourceKind::Users).unwrap());
    }

    #[tokio::test]
    async fn test_fetch_all_is_cached() {
        let store = FallbackStore::new(MemoryStore::new());
        let service = offline::<Notice>(&store);

        let first = service.fetch_all().await.unwrap();
        // A record written behind the cache's back is not visible until the
        // key is invalidated.
        store.insert(Notice::new("Hidden", "not yet")).unwrap();
        let second = service.fetch_all().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_create_offline_then_fetch_all() {
        let store = FallbackStore::new(MemoryStore::new());
        let service = offline::<Event>(&store);
        service.fetch_all().await.unwrap();

        let created = service
            .create(Event::new("Robotics Demo", "2099-03-01", "Lab 3"), 1)
            .await
            .unwrap();
        let events = service.fetch_all().await.unwrap();

        assert_eq!(events[0], created);
        assert_eq!(events.iter().filter(|e| e.id == created.id).count(), 1);
        assert_eq!(events.len(), seed::events().len() + 1);
    }

    #[tokio::test]
    async fn test_create_without_prior_read_keeps_seed() {
        let store = FallbackStore::new(MemoryStore::new());
        let service = offline::<User>(&store);

        service
            .create(User::new("New Student", "new@campus.edu", "STUDENT"), 1)
            .await
            .unwrap();
        let users = service.fetch_all().await.unwrap();
        assert_eq!(users.len(), 6);
    }

    #[tokio::test]
    async fn test_create_fails_when_both_paths_fail() {
        let store = FallbackStore::new(MemoryStore::with_capacity(64));
        let service = offline::<FoundItem>(&store);

        let err = service
            .create(FoundItem::new("Keys", "Parking Lot B"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Fallback(StoreError::Full { .. })));
    }

    #[tokio::test]
    async fn test_update_and_delete_are_remote_only() {
        let store = FallbackStore::new(MemoryStore::new());
        let service = offline::<Notice>(&store);

        let err = service.update(1, Notice::new("x", "y"), 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Remote(_)));
        let err = service.delete(1, 1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Remote(_)));
    }

    #[tokio::test]
    async fn test_fetch_one_offline() {
        let store = FallbackStore::new(MemoryStore::new());
        let service = offline::<Event>(&store);

        let event = service.fetch_one(1).await.unwrap().unwrap();
        assert_eq!(event.title, "Tech Hackathon 2024");
        assert!(service.fetch_one(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_filtered_reads_offline() {
        let store = FallbackStore::new(MemoryStore::new());
        let notices = offline::<Notice>(&store);

        let found = notices.search("library").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Library Extended Hours");

        let high = notices.high_priority().await.unwrap();
        assert!(high.iter().all(|n| n.is_high_priority()));
        assert_eq!(notices.active().await.unwrap().len(), seed::notices().len());
        assert!(notices.by_status("ARCHIVED").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notice_category_priority_and_user_offline() {
        let store = FallbackStore::new(MemoryStore::new());
        let notices = offline::<Notice>(&store);

        let academic = notices.by_category("academic").await.unwrap();
        assert_eq!(academic.len(), 1);
        assert_eq!(academic[0].title, "Academic Calendar Updated");

        let normal = notices.by_priority("NORMAL").await.unwrap();
        assert_eq!(normal.len(), 2);
        assert!(normal.iter().all(|n| n.priority == "NORMAL"));

        assert_eq!(notices.by_user(2).await.unwrap().len(), seed::notices().len());
        assert!(notices.by_user(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_location_and_user_offline() {
        let store = FallbackStore::new(MemoryStore::new());
        let events = offline::<Event>(&store);

        let hall = events.by_location("conference hall").await.unwrap();
        assert_eq!(hall.len(), 1);
        assert_eq!(hall[0].title, "Career Development Workshop");
        assert!(events.by_location("Library").await.unwrap().is_empty());

        assert_eq!(events.by_user(3).await.unwrap().len(), seed::events().len());
        assert!(events.by_user(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upcoming_offline() {
        let store = FallbackStore::new(MemoryStore::new());
        let events = offline::<Event>(&store);
        events
            .create(Event::new("Graduation", "2099-06-01", "Quad"), 1)
            .await
            .unwrap();

        let upcoming = events.upcoming().await.unwrap();
        assert!(upcoming.iter().any(|e| e.title == "Graduation"));
        assert!(upcoming.iter().all(|e| e.title != "Tech Hackathon 2024"));
    }
}
