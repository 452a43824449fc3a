use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::domain::*;
use crate::domain::listing::{EventCriteria, NoticeCriteria};
use crate::error::Result;

pub mod user_repository;
pub mod department_repository;
pub mod notice_repository;
pub mod event_repository;
pub mod media_file_repository;
mod listing_sql;

pub use user_repository::SqliteUserRepository;
pub use department_repository::SqliteDepartmentRepository;
pub use notice_repository::SqliteNoticeRepository;
pub use event_repository::SqliteEventRepository;
pub use media_file_repository::SqliteMediaFileRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Exact, case-sensitive match against either unique field.
    async fn find_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    async fn password_hash(&self, id: i64) -> Result<Option<String>>;
    async fn set_role(&self, id: i64, role: Role) -> Result<User>;
}

#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<Department>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Department>>;
    async fn exists(&self, id: i64) -> Result<bool>;
    async fn list(&self) -> Result<Vec<Department>>;
}

#[async_trait]
pub trait NoticeRepository: Send + Sync {
    async fn create(&self, publisher_id: i64, input: &NoticeInput, issue_date: DateTime<Utc>) -> Result<Notice>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Notice>>;
    async fn find_detail(&self, id: i64) -> Result<Option<NoticeDetail>>;
    async fn search(&self, criteria: &NoticeCriteria) -> Result<Page<NoticeSummary>>;
    async fn list_recent(&self, limit: i64) -> Result<Vec<NoticeSummary>>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Notice>>;
    async fn update(&self, id: i64, input: &NoticeInput, editor_id: i64, edited_at: DateTime<Utc>) -> Result<Notice>;
    /// Removes the notice and its media files in one transaction.
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create(&self, organizer_id: i64, input: &EventInput) -> Result<Event>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Event>>;
    async fn find_detail(&self, id: i64) -> Result<Option<EventDetail>>;
    async fn search(&self, criteria: &EventCriteria) -> Result<Page<EventSummary>>;
    async fn list_upcoming(&self, from: DateTime<Utc>, limit: i64) -> Result<Vec<EventSummary>>;
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Event>>;
    async fn update(&self, id: i64, input: &EventInput, editor_id: i64, edited_at: DateTime<Utc>) -> Result<Event>;
    /// Removes the event and its media files in one transaction.
    async fn delete(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait MediaFileRepository: Send + Sync {
    async fn create(&self, filename: &str, owner: MediaOwner) -> Result<MediaFile>;
    async fn list_for(&self, owner: MediaOwner) -> Result<Vec<MediaFile>>;
}
