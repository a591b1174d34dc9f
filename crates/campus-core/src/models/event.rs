use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::kind::{timestamp, Collection, Editable, Resource, ResourceKind};
use super::{contains_ignore_case, Attribution};

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "eventDate", default)]
    pub event_date: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "postedBy", default, skip_serializing_if = "Option::is_none")]
    pub posted_by: Option<Attribution>,
}

fn default_status() -> String {
    "ACTIVE".to_string()
}

impl Event {
    /// A new, unsaved event.
    pub fn new(title: impl Into<String>, event_date: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            event_date: event_date.into(),
            location: location.into(),
            image_url: None,
            status: default_status(),
            created_at: None,
            updated_at: None,
            posted_by: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Parse the leading `YYYY-MM-DD` of the event date.
    pub fn date(&self) -> Option<NaiveDate> {
        let prefix = self.event_date.get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }

    /// Active events on or after `today`.
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE") && self.date().is_some_and(|d| d >= today)
    }
}

impl Resource for Event {
    const KIND: ResourceKind = ResourceKind::Events;

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn stamp(&mut self, id: i64, now: DateTime<Utc>) {
        self.id = Some(id);
        self.created_at = Some(timestamp(now));
        self.posted_by.get_or_insert_with(Attribution::placeholder);
    }

    fn into_collection(items: Vec<Self>) -> Collection {
        Collection::Events(items)
    }

    fn from_collection(collection: Collection) -> Option<Vec<Self>> {
        match collection {
            Collection::Events(items) => Some(items),
            _ => None,
        }
    }
}

impl Editable for Event {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_server_event() {
        let json = r#"{
            "id": 7,
            "title": "Tech Hackathon 2024",
            "description": "24h coding",
            "eventDate": "2024-12-15T09:00:00",
            "location": "Main Auditorium",
            "status": "ACTIVE",
            "createdAt": "2024-11-01T10:00:00",
            "postedBy": { "id": 2, "name": "Prof. Smith", "email": "smith@campus.edu" }
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, Some(7));
        assert_eq!(event.date(), NaiveDate::from_ymd_opt(2024, 12, 15));
        assert_eq!(event.posted_by_id(), Some(2));
        assert_eq!(event.posted_by.as_ref().unwrap().name, "Prof. Smith");
    }

    #[test]
    fn test_stamp_keeps_existing_attribution() {
        let mut event = Event::new("Seminar", "2025-01-10", "CS Building");
        event.posted_by = Some(Attribution {
            id: Some(3),
            name: "Admin User".to_string(),
            email: None,
        });
        event.stamp(42, Utc::now());
        assert_eq!(event.id, Some(42));
        assert!(event.created_at.is_some());
        assert_eq!(event.posted_by.unwrap().name, "Admin User");
    }

    #[test]
    fn test_stamp_synthesizes_attribution() {
        let mut event = Event::new("Seminar", "2025-01-10", "CS Building");
        event.stamp(1, Utc::now());
        assert_eq!(event.posted_by, Some(Attribution::placeholder()));
    }

    #[test]
    fn test_is_upcoming() {
        let today = NaiveDate::from_ymd_opt(2024, 12, 12).unwrap();
        assert!(Event::new("A", "2024-12-15", "Hall").is_upcoming(today));
        assert!(!Event::new("B", "2024-12-10", "Hall").is_upcoming(today));

        let mut cancelled = Event::new("C", "2024-12-20", "Hall");
        cancelled.status = "CANCELLED".to_string();
        assert!(!cancelled.is_upcoming(today));

        assert!(!Event::new("D", "someday", "Hall").is_upcoming(today));
    }

    #[test]
    fn test_matches_keyword() {
        let event = Event::new("Annual Sports Meet", "2024-12-20", "Sports Complex")
            .with_description("Track and field");
        assert!(event.matches_keyword("sports"));
        assert!(event.matches_keyword("FIELD"));
        assert!(!event.matches_keyword("robotics"));
    }
}
