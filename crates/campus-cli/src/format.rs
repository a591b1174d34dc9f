use campus_core::{Collection, DashboardSummary, NotificationMessage};

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

/// Format a date string to a more readable format
pub fn format_date(date: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date) {
        dt.format("%b %d, %Y").to_string()
    } else if let Ok(d) = chrono::NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d") {
        d.format("%b %d, %Y").to_string()
    } else {
        date.to_string()
    }
}

fn format_id(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

/// One line per record, newest first as stored.
pub fn collection_rows(collection: &Collection) -> Vec<String> {
    match collection {
        Collection::Events(events) => events
            .iter()
            .map(|e| {
                format!(
                    "{:>14}  {:<13} {:<32} {:<20} {}",
                    format_id(e.id),
                    format_date(&e.event_date),
                    truncate_string(&e.title, 32),
                    truncate_string(&e.location, 20),
                    e.status
                )
            })
            .collect(),
        Collection::Notices(notices) => notices
            .iter()
            .map(|n| {
                format!(
                    "{:>14}  {:<6} {:<14} {:<40} {}",
                    format_id(n.id),
                    n.priority,
                    n.category,
                    truncate_string(&n.title, 40),
                    n.status
                )
            })
            .collect(),
        Collection::LostItems(items) => items
            .iter()
            .map(|i| {
                format!(
                    "{:>14}  {:<24} {:<24} {}",
                    format_id(i.id),
                    truncate_string(&i.item_name, 24),
                    truncate_string(&i.location, 24),
                    i.status
                )
            })
            .collect(),
        Collection::FoundItems(items) => items
            .iter()
            .map(|i| {
                format!(
                    "{:>14}  {:<24} {:<24} {}",
                    format_id(i.id),
                    truncate_string(&i.item_name, 24),
                    truncate_string(&i.location, 24),
                    i.found_date.as_deref().map(format_date).unwrap_or_default()
                )
            })
            .collect(),
        Collection::Users(users) => users
            .iter()
            .map(|u| {
                format!(
                    "{:>14}  {:<20} {:<28} {:<8} {}",
                    format_id(u.id),
                    truncate_string(&u.name, 20),
                    truncate_string(&u.email, 28),
                    u.role,
                    format_optional(&u.department, "")
                )
            })
            .collect(),
    }
}

pub fn dashboard_lines(summary: &DashboardSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Total events:        {}", summary.total_events),
        format!("Active notices:      {}", summary.active_notices),
        format!("Pending lost items:  {}", summary.pending_lost_items),
        format!("Users:               {}", summary.total_users),
    ];

    if !summary.high_priority_notices.is_empty() {
        lines.push(String::new());
        lines.push("High priority:".to_string());
        lines.extend(
            summary
                .high_priority_notices
                .iter()
                .map(|n| format!("  ! {}", truncate_string(&n.title, 60))),
        );
    }

    lines.push(String::new());
    lines.push("Recent notices:".to_string());
    lines.extend(summary.recent_notices.iter().map(|n| {
        let date = n.created_at.as_deref().map(format_date).unwrap_or_default();
        format!("  {:<13} {}", date, truncate_string(&n.title, 60))
    }));
    lines
}

pub fn format_message(message: &NotificationMessage) -> String {
    format!("[{}] {}", format_optional(&message.time, "--:--:--"), message.text)
}
