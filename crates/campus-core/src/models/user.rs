use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::kind::{Collection, Resource, ResourceKind};

/// A campus account. `role` is STUDENT, FACULTY or ADMIN.
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

fn default_role() -> String {
    "STUDENT".to_string()
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            password: None,
            role: role.into(),
            department: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// The identity shown in the header while no real authentication exists.
    pub fn current() -> Self {
        Self {
            department: Some("Computer Science".to_string()),
            ..Self::new("John Doe", "john.doe@campus.edu", "STUDENT").with_id(1)
        }
    }
}

impl Resource for User {
    const KIND: ResourceKind = ResourceKind::Users;

    fn id(&self) -> Option<i64> {
        self.id
    }

    // Users carry no timestamp or attribution; the password never reaches
    // the local snapshot.
    fn stamp(&mut self, id: i64, _now: DateTime<Utc>) {
        self.id = Some(id);
        self.password = None;
    }

    fn into_collection(items: Vec<Self>) -> Collection {
        Collection::Users(items)
    }

    fn from_collection(collection: Collection) -> Option<Vec<Self>> {
        match collection {
            Collection::Users(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_drops_password() {
        let mut user = User::new("Jane Wilson", "jane.wilson@campus.edu", "STUDENT");
        user.password = Some("hunter2".to_string());
        user.stamp(99, Utc::now());
        assert_eq!(user.id, Some(99));
        assert!(user.password.is_none());
    }

    #[test]
    fn test_current_user() {
        let me = User::current();
        assert_eq!(me.id, Some(1));
        assert_eq!(me.department.as_deref(), Some("Computer Science"));
    }
}
