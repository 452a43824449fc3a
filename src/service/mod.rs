pub mod user_service;
pub mod listing_service;
pub mod notice_service;
pub mod event_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::{AuthService, CsrfService};
use crate::error::{FieldErrors, Result};
use user_service::UserService;
use listing_service::ListingService;
use notice_service::NoticeService;
use event_service::EventService;

pub use listing_service::Listing;

pub const INVALID_DEPARTMENT: &str = "Not a valid department.";

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub department_repo: Arc<dyn DepartmentRepository>,
    pub notice_repo: Arc<dyn NoticeRepository>,
    pub event_repo: Arc<dyn EventRepository>,
    pub media_file_repo: Arc<dyn MediaFileRepository>,
    pub auth_service: Arc<AuthService>,
    pub csrf_service: Arc<CsrfService>,
    pub user_service: Arc<UserService>,
    pub listing_service: Arc<ListingService>,
    pub notice_service: Arc<NoticeService>,
    pub event_service: Arc<EventService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(db_pool: SqlitePool) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let department_repo: Arc<dyn DepartmentRepository> = Arc::new(SqliteDepartmentRepository::new(db_pool.clone()));
        let notice_repo: Arc<dyn NoticeRepository> = Arc::new(SqliteNoticeRepository::new(db_pool.clone()));
        let event_repo: Arc<dyn EventRepository> = Arc::new(SqliteEventRepository::new(db_pool.clone()));
        let media_file_repo: Arc<dyn MediaFileRepository> = Arc::new(SqliteMediaFileRepository::new(db_pool.clone()));

        let auth_service = Arc::new(AuthService::new(db_pool.clone()));
        let csrf_service = Arc::new(CsrfService::new(db_pool.clone()));

        let user_service = Arc::new(UserService::new(user_repo.clone()));
        let listing_service = Arc::new(ListingService::new(
            department_repo.clone(),
            notice_repo.clone(),
            event_repo.clone(),
        ));
        let notice_service = Arc::new(NoticeService::new(notice_repo.clone(), department_repo.clone()));
        let event_service = Arc::new(EventService::new(event_repo.clone(), department_repo.clone()));

        Self {
            user_repo,
            department_repo,
            notice_repo,
            event_repo,
            media_file_repo,
            auth_service,
            csrf_service,
            user_service,
            listing_service,
            notice_service,
            event_service,
            db_pool,
        }
    }
}

/// A chosen department must exist; `None` means no department.
pub(crate) async fn department_errors(
    departments: &dyn DepartmentRepository,
    department_id: Option<i64>,
) -> Result<FieldErrors> {
    let mut errors = FieldErrors::new();
    if let Some(id) = department_id {
        if !departments.exists(id).await? {
            errors.add("department_id", INVALID_DEPARTMENT);
        }
    }
    Ok(errors)
}
