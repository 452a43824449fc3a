use std::sync::Arc;

use crate::{
    domain::{
        listing::{ListCriteria, Normalized, SortKey},
        Department, EventCategory, EventSummary, ListQuery, ListingParams, NoticeSummary, Page,
    },
    error::Result,
    repository::{DepartmentRepository, EventRepository, NoticeRepository},
};

/// One rendered page of a listing plus everything the filter controls need.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub page: Page<T>,
    pub params: ListingParams,
    pub warnings: Vec<String>,
    pub departments: Vec<Department>,
    pub categories: Vec<&'static str>,
}

pub struct ListingService {
    departments: Arc<dyn DepartmentRepository>,
    notices: Arc<dyn NoticeRepository>,
    events: Arc<dyn EventRepository>,
}

impl ListingService {
    pub fn new(
        departments: Arc<dyn DepartmentRepository>,
        notices: Arc<dyn NoticeRepository>,
        events: Arc<dyn EventRepository>,
    ) -> Self {
        Self { departments, notices, events }
    }

    /// Never fails: bad parameters and store errors become warnings.
    pub async fn notices(&self, query: &ListQuery) -> Listing<NoticeSummary> {
        let Normalized { mut criteria, mut warnings } = query.notice_criteria();

        let result = match self.resolve_department(&mut criteria, &mut warnings).await {
            Ok(()) => self.notices.search(&criteria).await,
            Err(e) => Err(e),
        };

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Notice listing query failed: {}", e);
                warnings.push("Error retrieving notices.".to_string());
                Page::empty(criteria.page)
            }
        };

        Listing {
            page,
            params: criteria.params(),
            warnings,
            departments: self.department_choices().await,
            categories: Vec::new(),
        }
    }

    pub async fn events(&self, query: &ListQuery) -> Listing<EventSummary> {
        let Normalized { mut criteria, mut warnings } = query.event_criteria();

        let result = match self.resolve_department(&mut criteria, &mut warnings).await {
            Ok(()) => self.events.search(&criteria).await,
            Err(e) => Err(e),
        };

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Event listing query failed: {}", e);
                warnings.push("Error retrieving events.".to_string());
                Page::empty(criteria.page)
            }
        };

        Listing {
            page,
            params: criteria.params(),
            warnings,
            departments: self.department_choices().await,
            categories: EventCategory::ALL.iter().map(|c| c.as_str()).collect(),
        }
    }

    /// Drops a department filter whose id is not in the store.
    async fn resolve_department<K: SortKey>(
        &self,
        criteria: &mut ListCriteria<K>,
        warnings: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(id) = criteria.department_id {
            if !self.departments.exists(id).await? {
                warnings.push(format!("Department ID {} not found.", id));
                criteria.department_id = None;
            }
        }
        Ok(())
    }

    async fn department_choices(&self) -> Vec<Department> {
        self.departments.list().await.unwrap_or_else(|e| {
            tracing::warn!("Could not load departments: {}", e);
            Vec::new()
        })
    }
}
