use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::{timestamp, Collection, Resource, ResourceKind};
use super::{contains_ignore_case, Attribution};

/// An item someone reported as lost. `status` is PENDING, FOUND or CLAIMED.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "itemName")]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Attribution>,
}

fn default_status() -> String {
    "PENDING".to_string()
}

impl LostItem {
    pub fn new(item_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: None,
            item_name: item_name.into(),
            description: String::new(),
            location: location.into(),
            status: default_status(),
            created_at: None,
            updated_at: None,
            user: None,
        }
    }

    pub fn matches_search(&self, term: &str) -> bool {
        contains_ignore_case(&self.item_name, term) || contains_ignore_case(&self.description, term)
    }
}

impl Resource for LostItem {
    const KIND: ResourceKind = ResourceKind::LostItems;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn stamp(&mut self, id: i64, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(timestamp(now));
        self.user
            .get_or_insert_with(|| Attribution::placeholder_with_email(None));
    }

    fn into_collection(items: Vec<Self>) -> Collection {
        Collection::LostItems(items)
    }

    fn from_collection(collection: Collection) -> Option<Vec<Self>> {
        match collection {
            Collection::LostItems(items) => Some(items),
            _ => None,
        }
    }
}

/// An item someone handed in.
///
/// `reporter_email` is the contact address typed into the report form; it
/// only feeds the synthesized `reported_by` and is not a server field.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "itemName")]
    pub item_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "photoUrl", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(rename = "foundDate", default, skip_serializing_if = "Option::is_none")]
    pub found_date: Option<String>,
    #[serde(rename = "reporterEmail", default, skip_serializing_if = "Option::is_none")]
    pub reporter_email: Option<String>,
    #[serde(rename = "reportedBy", default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<Attribution>,
}

impl FoundItem {
    pub fn new(item_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: None,
            item_name: item_name.into(),
            description: String::new(),
            location: location.into(),
            photo_url: None,
            found_date: None,
            reporter_email: None,
            reported_by: None,
        }
    }

    pub fn matches_search(&self, term: &str) -> bool {
        contains_ignore_case(&self.item_name, term) || contains_ignore_case(&self.description, term)
    }
}

impl Resource for FoundItem {
    const KIND: ResourceKind = ResourceKind::FoundItems;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn stamp(&mut self, id: i64, now: DateTime<Utc>) {
        self.id = Some(id);
        self.found_date.get_or_insert_with(|| timestamp(now));
        let email = self.reporter_email.clone();
        self.reported_by
            .get_or_insert_with(|| Attribution::placeholder_with_email(email.as_deref()));
    }

    fn into_collection(items: Vec<Self>) -> Collection {
        Collection::FoundItems(items)
    }

    fn from_collection(collection: Collection) -> Option<Vec<Self>> {
        match collection {
            Collection::FoundItems(items) => Some(items),
            _ => None,
        }
    }
}
