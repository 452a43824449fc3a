use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MediaFile, Owned};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub issue_date: DateTime<Utc>,
    /// Publishing user; the owner for edit/delete purposes.
    pub user_id: i64,
    pub department_id: Option<i64>,
    pub last_edited_by_id: Option<i64>,
    pub last_edited_at: Option<DateTime<Utc>>,
}

impl Owned for Notice {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// A notice joined with the names a page needs to show it.
#[derive(Debug, Clone, Serialize)]
pub struct NoticeSummary {
    pub notice: Notice,
    pub publisher: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticeDetail {
    pub notice: Notice,
    pub publisher: String,
    pub department: Option<String>,
    pub last_editor: Option<String>,
    pub media_files: Vec<MediaFile>,
}

/// Fields a publisher supplies when creating or editing a notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeInput {
    pub title: String,
    pub content: String,
    pub department_id: Option<i64>,
}
