//! Data models for campus dashboard records.
//!
//! This module contains the record types served by the remote API and the
//! offline fallback store:
//!
//! - `Event`, `Notice`: Calendar events and noticeboard posts
//! - `LostItem`, `FoundItem`: Lost & found reports
//! - `User`: Campus accounts
//! - `ResourceKind`, `Collection`, `Resource`: The glue that lets one cache
//!   and one fallback store serve every record type

pub mod event;
pub mod kind;
pub mod lost_found;
pub mod notice;
pub mod user;

pub use event::Event;
pub use kind::{Collection, Editable, Resource, ResourceKind};
pub use lost_found::{FoundItem, LostItem};
pub use notice::Notice;
pub use user::User;

use serde::{Deserialize, Serialize};

/// Name used for records created while the remote API is unavailable.
pub const PLACEHOLDER_NAME: &str = "Current User";

/// Email attached to placeholder lost & found reports.
pub const PLACEHOLDER_EMAIL: &str = "user@campus.edu";

/// Who posted, reported or lost a record.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Attribution {
    /// The fixed identity stamped onto fallback-created notices and events.
    pub fn placeholder() -> Self {
        Self {
            id: None,
            name: PLACEHOLDER_NAME.to_string(),
            email: None,
        }
    }

    /// Placeholder identity with a contact email, used for lost & found reports.
    pub fn placeholder_with_email(email: Option<&str>) -> Self {
        Self {
            email: Some(email.unwrap_or(PLACEHOLDER_EMAIL).to_string()),
            ..Self::placeholder()
        }
    }
}

/// Case-insensitive substring match used by local search filters.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
