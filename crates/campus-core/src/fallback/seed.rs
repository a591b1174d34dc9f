//! Built-in campus records used to seed the fallback store.

use crate::models::{Attribution, Event, FoundItem, LostItem, Notice, ResourceKind, User};

use super::StoreError;

fn staff(id: i64, name: &str, email: &str) -> Option<Attribution> {
    Some(Attribution {
        id: Some(id),
        name: name.to_string(),
        email: Some(email.to_string()),
    })
}

fn event(id: i64, title: &str, date: &str, location: &str, description: &str) -> Event {
    Event {
        id: Some(id),
        created_at: Some("2024-11-20T09:00:00.000Z".to_string()),
        posted_by: staff(3, "Admin User", "admin@campus.edu"),
        ..Event::new(title, date, location).with_description(description)
    }
}

pub fn events() -> Vec<Event> {
    vec![
        event(1, "Tech Hackathon 2024", "2024-12-15", "Main Auditorium", "Academic: 24-hour team coding challenge"),
        event(2, "Annual Sports Meet", "2024-12-20", "Sports Complex", "Sports: inter-department athletics"),
        event(3, "Cultural Festival", "2024-12-25", "Campus Grounds", "Cultural: music, dance and food stalls"),
        event(4, "Career Development Workshop", "2024-12-10", "Conference Hall", "Workshop: resumes and interview practice"),
        event(5, "AI/ML Seminar", "2024-12-18", "CS Building", "Academic: guest talk on applied machine learning"),
    ]
}

fn notice(id: i64, title: &str, description: &str, priority: &str, category: &str) -> Notice {
    Notice {
        id: Some(id),
        created_at: Some("2024-11-25T08:30:00.000Z".to_string()),
        posted_by: staff(2, "Prof. Smith", "smith@campus.edu"),
        ..Notice::new(title, description)
            .with_priority(priority)
            .with_category(category)
    }
}

pub fn notices() -> Vec<Notice> {
    vec![
        notice(1, "Academic Calendar Updated", "The spring semester now starts on January 13.", "HIGH", "ACADEMIC"),
        notice(2, "Library Extended Hours", "The main library stays open until midnight during finals.", "NORMAL", "ADMINISTRATIVE"),
        notice(3, "Tech Fest Volunteers Needed", "Sign up at the student affairs office by Friday.", "NORMAL", "EVENT"),
        notice(4, "Campus Wi-Fi Maintenance", "Expect short outages on Saturday between 2 and 4 AM.", "LOW", "GENERAL"),
    ]
}

pub fn lost_items() -> Vec<LostItem> {
    let item = |id: i64, name: &str, description: &str, location: &str| LostItem {
        id: Some(id),
        description: description.to_string(),
        created_at: Some("2024-12-01T12:00:00.000Z".to_string()),
        user: staff(4, "Jane Wilson", "jane.wilson@campus.edu"),
        ..LostItem::new(name, location)
    };
    vec![
        item(1, "Blue Backpack", "Navy blue with a laptop sleeve", "Library, 2nd floor"),
        item(2, "Student ID Card", "Issued to the Engineering department", "Cafeteria"),
        item(3, "Water Bottle", "Steel bottle with a green lid", "Gymnasium"),
    ]
}

pub fn found_items() -> Vec<FoundItem> {
    let item = |id: i64, name: &str, description: &str, location: &str| FoundItem {
        id: Some(id),
        description: description.to_string(),
        found_date: Some("2024-12-02T15:30:00.000Z".to_string()),
        reported_by: staff(1, "John Doe", "john.doe@campus.edu"),
        ..FoundItem::new(name, location)
    };
    vec![
        item(1, "Scientific Calculator", "Casio, name scratched off", "Room 204"),
        item(2, "Car Keys", "Keyring with a small flashlight", "Parking Lot B"),
    ]
}

pub fn users() -> Vec<User> {
    vec![
        User::new("John Doe", "john.doe@campus.edu", "STUDENT").with_id(1),
        User::new("Prof. Smith", "smith@campus.edu", "FACULTY").with_id(2),
        User::new("Admin User", "admin@campus.edu", "ADMIN").with_id(3),
        User::new("Jane Wilson", "jane.wilson@campus.edu", "STUDENT").with_id(4),
        User::new("Dr. Johnson", "johnson@campus.edu", "FACULTY").with_id(5),
    ]
}

/// The serialized seed dataset for `kind`.
pub fn seed_json(kind: ResourceKind) -> Result<String, StoreError> {
    let json = match kind {
        ResourceKind::Notices => serde_json::to_string(&notices()),
        ResourceKind::Events => serde_json::to_string(&events()),
        ResourceKind::LostItems => serde_json::to_string(&lost_items()),
        ResourceKind::FoundItems => serde_json::to_string(&found_items()),
        ResourceKind::Users => serde_json::to_string(&users()),
    };
    json.map_err(StoreError::Encode)
}
