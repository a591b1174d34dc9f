use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::{timestamp, Collection, Editable, Resource, ResourceKind};
use super::{contains_ignore_case, Attribution};

/// A noticeboard post.
///
/// `priority` is one of HIGH, NORMAL, LOW; `category` one of ACADEMIC,
/// ADMINISTRATIVE, EVENT, GENERAL; `status` one of ACTIVE, ARCHIVED, DRAFT.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(rename = "validUntil", default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(rename = "attachmentUrl", default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "postedBy", default, skip_serializing_if = "Option::is_none")]
    pub posted_by: Option<Attribution>,
}

fn default_priority() -> String {
    "NORMAL".to_string()
}

fn default_category() -> String {
    "GENERAL".to_string()
}

fn default_status() -> String {
    "ACTIVE".to_string()
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: description.into(),
            priority: default_priority(),
            category: default_category(),
            valid_until: None,
            status: default_status(),
            attachment_url: None,
            created_at: None,
            updated_at: None,
            posted_by: None,
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }

    pub fn is_high_priority(&self) -> bool {
        self.priority.eq_ignore_ascii_case("HIGH")
    }
}

impl Resource for Notice {
    const KIND: ResourceKind = ResourceKind::Notices;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn stamp(&mut self, id: i64, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(timestamp(now));
        self.posted_by.get_or_insert_with(Attribution::placeholder);
    }

    fn into_collection(items: Vec<Self>) -> Collection {
        Collection::Notices(items)
    }

    fn from_collection(collection: Collection) -> Option<Vec<Self>> {
        match collection {
            Collection::Notices(items) => Some(items),
            _ => None,
        }
    }
}

impl Editable for Notice {
    fn status(&self) -> &str {
        &self.status
    }

    fn posted_by_id(&self) -> Option<i64> {
        self.posted_by.as_ref().and_then(|by| by.id)
    }

    fn matches_keyword(&self, keyword: &str) -> bool {
        contains_ignore_case(&self.title, keyword) || contains_ignore_case(&self.description, keyword)
    }
}
