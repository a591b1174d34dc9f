use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::{Event, FoundItem, LostItem, Notice, User};

/// The five record collections the dashboard works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Notices,
    Events,
    LostItems,
    FoundItems,
    Users,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Notices,
        ResourceKind::Events,
        ResourceKind::LostItems,
        ResourceKind::FoundItems,
        ResourceKind::Users,
    ];

    /// Key the fallback snapshot is persisted under.
    pub fn storage_key(&self) -> &'static str {
        match self {
            ResourceKind::Notices => "campus_notices",
            ResourceKind::Events => "campus_events",
            ResourceKind::LostItems => "campus_lost_items",
            ResourceKind::FoundItems => "campus_found_items",
            ResourceKind::Users => "campus_users",
        }
    }

    /// Key the collection is cached under in the resource cache.
    pub fn cache_key(&self) -> &'static str {
        match self {
            ResourceKind::Notices => "notices",
            ResourceKind::Events => "events",
            ResourceKind::LostItems => "lostItems",
            ResourceKind::FoundItems => "foundItems",
            ResourceKind::Users => "users",
        }
    }

    /// Collection endpoint, relative to the API base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ResourceKind::Notices => "/notices",
            ResourceKind::Events => "/events",
            ResourceKind::LostItems => "/lost",
            ResourceKind::FoundItems => "/found",
            ResourceKind::Users => "/users",
        }
    }

    /// Endpoint new records are POSTed to.
    pub fn create_endpoint(&self) -> &'static str {
        match self {
            ResourceKind::Users => "/users/register",
            other => other.endpoint(),
        }
    }

    /// Whether writes carry the acting user as a `userId` query parameter.
    pub fn takes_actor(&self) -> bool {
        matches!(self, ResourceKind::Notices | ResourceKind::Events)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Notices => "notices",
            ResourceKind::Events => "events",
            ResourceKind::LostItems => "lost items",
            ResourceKind::FoundItems => "found items",
            ResourceKind::Users => "users",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "notices" | "notice" => Ok(ResourceKind::Notices),
            "events" | "event" => Ok(ResourceKind::Events),
            "lost" | "lost-items" | "lostitems" => Ok(ResourceKind::LostItems),
            "found" | "found-items" | "founditems" => Ok(ResourceKind::FoundItems),
            "users" | "user" => Ok(ResourceKind::Users),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}

/// A cached collection, tagged by the record type it holds.
///
/// All façades share one cache, so the cached value is this enum rather than
/// a bare `Vec<R>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Notices(Vec<Notice>),
    Events(Vec<Event>),
    LostItems(Vec<LostItem>),
    FoundItems(Vec<FoundItem>),
    Users(Vec<User>),
}

impl Collection {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Collection::Notices(_) => ResourceKind::Notices,
            Collection::Events(_) => ResourceKind::Events,
            Collection::LostItems(_) => ResourceKind::LostItems,
            Collection::FoundItems(_) => ResourceKind::FoundItems,
            Collection::Users(_) => ResourceKind::Users,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Notices(v) => v.len(),
            Collection::Events(v) => v.len(),
            Collection::LostItems(v) => v.len(),
            Collection::FoundItems(v) => v.len(),
            Collection::Users(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A record type that can be fetched, cached and stored offline.
pub trait Resource:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: ResourceKind;

    /// Server- or fallback-assigned identifier, if any.
    fn id(&self) -> Option<i64>;

    /// Fill in the fields the fallback store synthesizes on insert:
    /// the id, creation timestamp and attribution.
    fn stamp(&mut self, id: i64, now: DateTime<Utc>);

    fn into_collection(items: Vec<Self>) -> Collection;

    /// Unwrap a cached collection, or `None` if it holds another kind.
    fn from_collection(collection: Collection) -> Option<Vec<Self>>;
}

/// Records that also support lookup, update, delete and filtered reads.
pub trait Editable: Resource {
    fn status(&self) -> &str;

    /// Id of the account that posted the record, if attributed.
    fn posted_by_id(&self) -> Option<i64>;

    /// Local equivalent of the remote keyword search.
    fn matches_keyword(&self, keyword: &str) -> bool;
}

/// Timestamp format used for synthesized `createdAt`/`foundDate` values.
pub(crate) fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_fixed() {
        let keys: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.storage_key()).collect();
        assert_eq!(
            keys,
            vec![
                "campus_notices",
                "campus_events",
                "campus_lost_items",
                "campus_found_items",
                "campus_users"
            ]
        );
    }

    #[test]
    fn test_users_register_endpoint() {
        assert_eq!(ResourceKind::Users.create_endpoint(), "/users/register");
        assert_eq!(ResourceKind::Events.create_endpoint(), "/events");
    }

    #[test]
    fn test_only_posts_take_actor() {
        assert!(ResourceKind::Events.takes_actor());
        assert!(ResourceKind::Notices.takes_actor());
        assert!(!ResourceKind::LostItems.takes_actor());
        assert!(!ResourceKind::Users.takes_actor());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("lost".parse::<ResourceKind>(), Ok(ResourceKind::LostItems));
        assert_eq!("Events".parse::<ResourceKind>(), Ok(ResourceKind::Events));
        assert!("courses".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_collection_kind_round_trip() {
        let collection = Event::into_collection(vec![]);
        assert_eq!(collection.kind(), ResourceKind::Events);
        assert!(collection.is_empty());
        assert!(Notice::from_collection(collection).is_none());
    }
}
