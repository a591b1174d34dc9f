use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::cache::{ResourceCache, DEFAULT_SWEEP_INTERVAL};
use crate::config::Config;
use crate::fallback::{FallbackStore, FileStore, KeyValueStore};
use crate::models::{Collection, Event, FoundItem, LostItem, Notice, User};

use super::{ResourceService, ServiceError};

/// Number of notices shown in the dashboard's recent list.
const RECENT_NOTICES: usize = 5;

/// Number of high-priority notices highlighted on the dashboard.
const HIGHLIGHTED_NOTICES: usize = 3;

/// Headline numbers for the dashboard landing page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_events: usize,
    pub active_notices: usize,
    pub pending_lost_items: usize,
    pub total_users: usize,
    pub recent_notices: Vec<Notice>,
    pub high_priority_notices: Vec<Notice>,
}

impl DashboardSummary {
    fn build(events: &[Event], notices: &[Notice], lost_items: &[LostItem], users: &[User]) -> Self {
        Self {
            total_events: events.len(),
            active_notices: notices.iter().filter(|n| n.is_active()).count(),
            pending_lost_items: lost_items
                .iter()
                .filter(|item| item.status.eq_ignore_ascii_case("PENDING"))
                .count(),
            total_users: users.len(),
            recent_notices: notices.iter().take(RECENT_NOTICES).cloned().collect(),
            high_priority_notices: notices
                .iter()
                .filter(|n| n.is_active() && n.is_high_priority())
                .take(HIGHLIGHTED_NOTICES)
                .cloned()
                .collect(),
        }
    }
}

/// One façade per record type, all sharing a cache and a fallback store.
///
/// Building the services starts a task that sweeps stale cache entries once
/// a minute, so a Tokio runtime must be running. The task stops when the
/// services are dropped.
pub struct CampusServices<S> {
    pub events: ResourceService<Event, S>,
    pub notices: ResourceService<Notice, S>,
    pub lost_items: ResourceService<LostItem, S>,
    pub found_items: ResourceService<FoundItem, S>,
    pub users: ResourceService<User, S>,
    cache: ResourceCache<Collection>,
    store: FallbackStore<S>,
    sweeper: JoinHandle<()>,
}

impl<S: KeyValueStore> CampusServices<S> {
    pub fn new(api: ApiClient, cache: ResourceCache<Collection>, store: FallbackStore<S>) -> Self {
        let sweeper = cache.spawn_sweeper(DEFAULT_SWEEP_INTERVAL);
        Self {
            events: ResourceService::new(api.clone(), cache.clone(), store.clone()),
            notices: ResourceService::new(api.clone(), cache.clone(), store.clone()),
            lost_items: ResourceService::new(api.clone(), cache.clone(), store.clone()),
            found_items: ResourceService::new(api.clone(), cache.clone(), store.clone()),
            users: ResourceService::new(api, cache.clone(), store.clone()),
            cache,
            store,
            sweeper,
        }
    }

    pub fn cache(&self) -> &ResourceCache<Collection> {
        &self.cache
    }

    pub fn store(&self) -> &FallbackStore<S> {
        &self.store
    }

    /// Fetch the dashboard's collections concurrently and summarize them.
    pub async fn dashboard(&self) -> Result<DashboardSummary, ServiceError> {
        let (events, notices, lost_items, users) = futures::try_join!(
            self.events.fetch_all(),
            self.notices.fetch_all(),
            self.lost_items.fetch_all(),
            self.users.fetch_all(),
        )?;

        Ok(DashboardSummary::build(&events, &notices, &lost_items, &users))
    }

    /// The signed-in identity. There is no authentication, so this is
    /// always the same account.
    pub fn current_user(&self) -> User {
        User::current()
    }
}

impl<S> Drop for CampusServices<S> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

impl CampusServices<FileStore> {
    /// Services backed by the configured API and a file store in the data
    /// directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let api = ApiClient::new(&config.api_base_url, timeout)
            .context("Failed to build API client")?;

        let data_dir = config.data_dir()?;
        let store = FileStore::new(data_dir.join("fallback"))
            .with_context(|| format!("Failed to open fallback store in {}", data_dir.display()))?;

        let cache = ResourceCache::new(Duration::from_secs(config.cache_ttl_secs));
        Ok(Self::new(api, cache, FallbackStore::new(store)))
    }
}
