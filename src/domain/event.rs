use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MediaFile, Owned};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub venue: String,
    pub category: Option<EventCategory>,
    /// Organizing user; the owner for edit/delete purposes.
    pub user_id: i64,
    pub department_id: Option<i64>,
    pub last_edited_by_id: Option<i64>,
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl Owned for Event {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventCategory {
    Academic,
    Cultural,
    Sports,
    Workshop,
    Seminar,
    Other,
}

impl EventCategory {
    pub const ALL: [EventCategory; 6] = [
        EventCategory::Academic,
        EventCategory::Cultural,
        EventCategory::Sports,
        EventCategory::Workshop,
        EventCategory::Seminar,
        EventCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Academic => "Academic",
            EventCategory::Cultural => "Cultural",
            EventCategory::Sports => "Sports",
            EventCategory::Workshop => "Workshop",
            EventCategory::Seminar => "Seminar",
            EventCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<EventCategory> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSummary {
    pub event: Event,
    pub organizer: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub event: Event,
    pub organizer: String,
    pub department: Option<String>,
    pub last_editor: Option<String>,
    pub media_files: Vec<MediaFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub venue: String,
    pub category: Option<EventCategory>,
    pub department_id: Option<i64>,
}

impl EventInput {
    /// Events may not be scheduled before `now`; exactly `now` is allowed.
    pub fn is_in_past(&self, now: DateTime<Utc>) -> bool {
        self.event_date < now
    }
}
