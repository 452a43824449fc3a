use serde::{Deserialize, Serialize};

/// An attachment belonging to at most one notice or event.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct MediaFile {
    pub id: i64,
    pub filename: String,
    pub notice_id: Option<i64>,
    pub event_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOwner {
    Notice(i64),
    Event(i64),
}
