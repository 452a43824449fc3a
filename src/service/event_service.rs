use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{
    auth::gate,
    domain::*,
    error::{AppError, FieldErrors, Result},
    repository::{DepartmentRepository, EventRepository},
    service::department_errors,
};

pub const EVENT_IN_PAST: &str = "Event date cannot be in the past.";

pub struct EventService {
    events: Arc<dyn EventRepository>,
    departments: Arc<dyn DepartmentRepository>,
}

impl EventService {
    pub fn new(
        events: Arc<dyn EventRepository>,
        departments: Arc<dyn DepartmentRepository>,
    ) -> Self {
        Self { events, departments }
    }

    pub async fn detail(&self, actor: Option<&User>, id: i64) -> Result<EventDetail> {
        gate::require_authenticated(actor)?;
        self.events.find_detail(id).await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))
    }

    pub async fn upcoming(&self, limit: i64) -> Result<Vec<EventSummary>> {
        self.events.list_upcoming(Utc::now(), limit).await
    }

    pub async fn by_user(&self, user_id: i64) -> Result<Vec<Event>> {
        self.events.list_by_user(user_id).await
    }

    pub fn authorize_create<'a>(&self, actor: Option<&'a User>) -> Result<&'a User> {
        let actor = gate::require_authenticated(actor)?;
        gate::require_publisher_or_admin(actor)?;
        Ok(actor)
    }

    pub async fn authorize_manage(&self, actor: Option<&User>, id: i64) -> Result<Event> {
        let actor = gate::require_authenticated(actor)?;
        let event = self.events.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;
        gate::require_owner_or_admin(actor, &event)?;
        Ok(event)
    }

    pub async fn create(&self, actor: Option<&User>, input: EventInput) -> Result<Event> {
        self.create_at(actor, input, Utc::now()).await
    }

    /// Creates the event as of `now`; a date before `now` is a validation error.
    pub async fn create_at(&self, actor: Option<&User>, input: EventInput, now: DateTime<Utc>) -> Result<Event> {
        let actor = self.authorize_create(actor)?;
        self.validate(&input, now).await?;

        let event = self.events.create(actor.id, &input).await?;
        tracing::info!("User {} posted event {}", actor.id, event.id);
        Ok(event)
    }

    pub async fn update(&self, actor: Option<&User>, id: i64, input: EventInput) -> Result<Event> {
        self.update_at(actor, id, input, Utc::now()).await
    }

    pub async fn update_at(
        &self,
        actor: Option<&User>,
        id: i64,
        input: EventInput,
        now: DateTime<Utc>,
    ) -> Result<Event> {
        self.authorize_manage(actor, id).await?;
        let actor = gate::require_authenticated(actor)?;
        self.validate(&input, now).await?;

        let event = self.events.update(id, &input, actor.id, now).await?;
        tracing::info!("User {} edited event {}", actor.id, event.id);
        Ok(event)
    }

    pub async fn delete(&self, actor: Option<&User>, id: i64) -> Result<()> {
        self.authorize_manage(actor, id).await?;
        let actor = gate::require_authenticated(actor)?;

        self.events.delete(id).await?;
        tracing::info!("User {} deleted event {}", actor.id, id);
        Ok(())
    }

    async fn validate(&self, input: &EventInput, now: DateTime<Utc>) -> Result<()> {
        let mut errors = FieldErrors::new();
        if input.is_in_past(now) {
            errors.add("event_date", EVENT_IN_PAST);
        }
        errors.merge(department_errors(self.departments.as_ref(), input.department_id).await?);
        errors.into_result()
    }
}
