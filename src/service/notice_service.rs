use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::gate,
    domain::*,
    error::{AppError, Result},
    repository::{DepartmentRepository, NoticeRepository},
    service::department_errors,
};

pub struct NoticeService {
    notices: Arc<dyn NoticeRepository>,
    departments: Arc<dyn DepartmentRepository>,
}

impl NoticeService {
    pub fn new(
        notices: Arc<dyn NoticeRepository>,
        departments: Arc<dyn DepartmentRepository>,
    ) -> Self {
        Self { notices, departments }
    }

    pub async fn detail(&self, actor: Option<&User>, id: i64) -> Result<NoticeDetail> {
        gate::require_authenticated(actor)?;
        self.notices.find_detail(id).await?
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<NoticeSummary>> {
        self.notices.list_recent(limit).await
    }

    pub async fn by_user(&self, user_id: i64) -> Result<Vec<Notice>> {
        self.notices.list_by_user(user_id).await
    }

    /// Authentication then role; the actor who may post a notice.
    pub fn authorize_create<'a>(&self, actor: Option<&'a User>) -> Result<&'a User> {
        let actor = gate::require_authenticated(actor)?;
        gate::require_publisher_or_admin(actor)?;
        Ok(actor)
    }

    /// Authentication then ownership; the notice the actor may edit or delete.
    pub async fn authorize_manage(&self, actor: Option<&User>, id: i64) -> Result<Notice> {
        let actor = gate::require_authenticated(actor)?;
        let notice = self.notices.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;
        gate::require_owner_or_admin(actor, &notice)?;
        Ok(notice)
    }

    pub async fn create(&self, actor: Option<&User>, input: NoticeInput) -> Result<Notice> {
        let actor = self.authorize_create(actor)?;
        department_errors(self.departments.as_ref(), input.department_id).await?.into_result()?;

        let notice = self.notices.create(actor.id, &input, Utc::now()).await?;
        tracing::info!("User {} posted notice {}", actor.id, notice.id);
        Ok(notice)
    }

    /// Overwrites the editable fields and stamps the editor. The owner never changes.
    pub async fn update(&self, actor: Option<&User>, id: i64, input: NoticeInput) -> Result<Notice> {
        self.authorize_manage(actor, id).await?;
        let actor = gate::require_authenticated(actor)?;
        department_errors(self.departments.as_ref(), input.department_id).await?.into_result()?;

        let notice = self.notices.update(id, &input, actor.id, Utc::now()).await?;
        tracing::info!("User {} edited notice {}", actor.id, notice.id);
        Ok(notice)
    }

    pub async fn delete(&self, actor: Option<&User>, id: i64) -> Result<()> {
        self.authorize_manage(actor, id).await?;
        let actor = gate::require_authenticated(actor)?;

        self.notices.delete(id).await?;
        tracing::info!("User {} deleted notice {}", actor.id, id);
        Ok(())
    }
}
