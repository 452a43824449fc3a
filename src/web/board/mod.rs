pub mod forms;
pub mod home;
pub mod notices;
pub mod events;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
    Extension,
};
use chrono::{DateTime, Utc};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Department, ListingParams, Page, User},
    error::{AppError, Result},
    web::templates::UserInfo,
};

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
pub(crate) const HOME_LIMIT: i64 = 5;

/// Record id from the URL. Anything that is not an integer is a missing page.
#[derive(Debug, Clone, Copy)]
pub struct RecordId(pub i64);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecordId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| RecordId(id))
            .map_err(|_| AppError::NotFound("Page not found".to_string()))
    }
}

pub(crate) fn actor(current_user: &Option<Extension<CurrentUser>>) -> Option<&User> {
    current_user.as_ref().map(|c| &c.0.user)
}

pub(crate) fn user_info(current_user: &Option<Extension<CurrentUser>>) -> Option<UserInfo> {
    actor(current_user).map(UserInfo::from)
}

pub(crate) fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

pub(crate) fn department_label(name: Option<String>) -> String {
    name.unwrap_or_else(|| "General".to_string())
}

/// A fresh form token for the signed-in user's session.
pub(crate) async fn issue_csrf(state: &AppState, current_user: &Option<Extension<CurrentUser>>) -> Result<String> {
    let Some(Extension(current)) = current_user else {
        return Err(AppError::Forbidden);
    };
    state.service_context.csrf_service.generate_token(&current.session_id).await
}

/// Fails with `Forbidden` unless the submitted token belongs to this session.
pub(crate) async fn check_csrf(
    state: &AppState,
    current_user: &Option<Extension<CurrentUser>>,
    token: &str,
) -> Result<()> {
    let Some(Extension(current)) = current_user else {
        return Err(AppError::Forbidden);
    };
    state.service_context.csrf_service
        .verify(&current.session_id, Some(token))
        .await
}

#[derive(Debug, Clone)]
pub struct DepartmentOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

pub(crate) fn department_options(departments: &[Department], selected: i64) -> Vec<DepartmentOption> {
    departments
        .iter()
        .map(|d| DepartmentOption {
            id: d.id,
            name: d.name.clone(),
            selected: d.id == selected,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

pub(crate) fn select_options(choices: &[(&str, &str)], current: &str) -> Vec<SelectOption> {
    choices
        .iter()
        .map(|(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
            selected: *value == current,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PageLink {
    /// `None` renders as an ellipsis.
    pub number: Option<i64>,
    pub href: String,
    pub current: bool,
}

#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: i64,
    pub pages: i64,
    pub total: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_href: String,
    pub next_href: String,
    pub links: Vec<PageLink>,
}

impl Pagination {
    pub fn new<T>(page: &Page<T>, params: &ListingParams, base: &str) -> Self {
        let href = |num: i64| format!("{}?{}", base, params.query_for_page(num));

        Self {
            page: page.page,
            pages: page.pages(),
            total: page.total,
            has_prev: page.has_prev(),
            has_next: page.has_next(),
            prev_href: href(page.prev_num()),
            next_href: href(page.next_num()),
            links: page
                .page_links()
                .into_iter()
                .map(|number| PageLink {
                    number,
                    href: number.map(href).unwrap_or_default(),
                    current: number == Some(page.page),
                })
                .collect(),
        }
    }
}
