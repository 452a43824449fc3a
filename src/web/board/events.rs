use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    auth::gate,
    domain::{EventCategory, EventDetail, EventSummary, ListQuery, ListingParams},
    error::{AppError, FieldErrors, Result},
    web::{
        flash::{self, Flash, FlashLevel},
        templates::{HtmlTemplate, UserInfo},
    },
};

use super::{
    actor, check_csrf, department_label, department_options, format_date, issue_csrf,
    select_options, user_info,
    forms::{DeleteForm, EventForm},
    DepartmentOption, Pagination, RecordId, SelectOption,
};

const SORT_KEYS: [(&str, &str); 4] = [
    ("date", "Date"),
    ("title", "Title"),
    ("department", "Department"),
    ("category", "Category"),
];

const SORT_ORDERS: [(&str, &str); 2] = [
    ("asc", "Soonest first"),
    ("desc", "Latest first"),
];

pub struct EventRowView {
    pub id: i64,
    pub title: String,
    pub event_date: String,
    pub venue: String,
    pub category: String,
    pub organizer: String,
    pub department: String,
}

impl From<EventSummary> for EventRowView {
    fn from(summary: EventSummary) -> Self {
        let event = summary.event;
        Self {
            id: event.id,
            title: event.title,
            event_date: format_date(event.event_date),
            venue: event.venue,
            category: event.category.map(|c| c.as_str().to_string()).unwrap_or_default(),
            organizer: summary.organizer,
            department: department_label(summary.department),
        }
    }
}

pub struct EventDetailView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub event_date: String,
    pub venue: String,
    pub category: String,
    pub organizer: String,
    pub department: String,
    pub last_editor: Option<String>,
    pub last_edited_at: Option<String>,
    pub media_files: Vec<String>,
}

impl From<EventDetail> for EventDetailView {
    fn from(detail: EventDetail) -> Self {
        let event = detail.event;
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            event_date: format_date(event.event_date),
            venue: event.venue,
            category: event.category.map(|c| c.as_str().to_string()).unwrap_or_default(),
            organizer: detail.organizer,
            department: department_label(detail.department),
            last_editor: detail.last_editor,
            last_edited_at: event.last_edited_at.map(format_date),
            media_files: detail.media_files.into_iter().map(|m| m.filename).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "events/list.html")]
pub struct EventListTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub events: Vec<EventRowView>,
    pub pagination: Pagination,
    pub params: ListingParams,
    pub departments: Vec<DepartmentOption>,
    pub categories: Vec<SelectOption>,
    pub sort_keys: Vec<SelectOption>,
    pub sort_orders: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "events/detail.html")]
pub struct EventDetailTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub event: EventDetailView,
    pub can_manage: bool,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "events/form.html")]
pub struct EventFormTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub legend: String,
    pub action: String,
    pub cancel_href: String,
    pub csrf_token: String,
    pub form: EventForm,
    pub departments: Vec<DepartmentOption>,
    pub categories: Vec<SelectOption>,
    pub errors: FieldErrors,
}

fn category_options(current: &str) -> Vec<SelectOption> {
    let choices: Vec<(&str, &str)> = EventCategory::ALL
        .iter()
        .map(|c| (c.as_str(), c.as_str()))
        .collect();
    select_options(&choices, current)
}

// GET /events/
pub async fn list(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    gate::require_authenticated(actor(&current_user))?;

    let listing = state.service_context.listing_service.events(&query).await;

    let (jar, mut flashes) = flash::take(jar);
    flashes.extend(listing.warnings.into_iter().map(Flash::warning));

    let pagination = Pagination::new(&listing.page, &listing.params, "/events/");
    let departments = department_options(&listing.departments, listing.params.department_id);
    let categories = category_options(&listing.params.category);
    let sort_keys = select_options(&SORT_KEYS, &listing.params.sort_by);
    let sort_orders = select_options(&SORT_ORDERS, &listing.params.sort_order);

    Ok((jar, HtmlTemplate(EventListTemplate {
        current_user: user_info(&current_user),
        flashes,
        events: listing.page.items.into_iter().map(EventRowView::from).collect(),
        pagination,
        params: listing.params,
        departments,
        categories,
        sort_keys,
        sort_orders,
    })).into_response())
}

// GET /events/:id
pub async fn detail(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
) -> Result<Response> {
    let detail = state.service_context.event_service
        .detail(actor(&current_user), id)
        .await?;

    let can_manage = actor(&current_user)
        .map(|user| gate::can_manage(user, &detail.event))
        .unwrap_or(false);
    let csrf_token = if can_manage {
        issue_csrf(&state, &current_user).await?
    } else {
        String::new()
    };

    let (jar, flashes) = flash::take(jar);
    Ok((jar, HtmlTemplate(EventDetailTemplate {
        current_user: user_info(&current_user),
        flashes,
        event: detail.into(),
        can_manage,
        csrf_token,
    })).into_response())
}

// GET /events/new
pub async fn new_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
) -> Result<Response> {
    state.service_context.event_service.authorize_create(actor(&current_user))?;
    let csrf_token = issue_csrf(&state, &current_user).await?;

    render_form(&state, &current_user, jar, FormPage::Create, csrf_token, EventForm::default(), FieldErrors::new()).await
}

// POST /events/new
pub async fn create(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Form(form): Form<EventForm>,
) -> Result<Response> {
    let events = &state.service_context.event_service;
    events.authorize_create(actor(&current_user))?;
    check_csrf(&state, &current_user, &form.csrf_token).await?;

    let result = match form.to_input() {
        Ok(input) => events.create(actor(&current_user), input).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(_) => {
            let jar = flash::push(jar, FlashLevel::Success, "Your event has been posted!");
            Ok((jar, Redirect::to("/events/")).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let token = form.csrf_token.clone();
            render_form(&state, &current_user, jar, FormPage::Create, token, form, errors).await
        }
        Err(e) => Err(e),
    }
}

// GET /events/:id/edit
pub async fn edit_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
) -> Result<Response> {
    let event = state.service_context.event_service
        .authorize_manage(actor(&current_user), id)
        .await?;
    let csrf_token = issue_csrf(&state, &current_user).await?;

    let form = EventForm::from_event(&event);
    render_form(&state, &current_user, jar, FormPage::Edit(id), csrf_token, form, FieldErrors::new()).await
}

// POST /events/:id/edit
pub async fn update(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
    Form(form): Form<EventForm>,
) -> Result<Response> {
    let events = &state.service_context.event_service;
    events.authorize_manage(actor(&current_user), id).await?;
    check_csrf(&state, &current_user, &form.csrf_token).await?;

    let result = match form.to_input() {
        Ok(input) => events.update(actor(&current_user), id, input).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(event) => {
            let jar = flash::push(jar, FlashLevel::Success, "Your event has been updated!");
            Ok((jar, Redirect::to(&format!("/events/{}", event.id))).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let token = form.csrf_token.clone();
            render_form(&state, &current_user, jar, FormPage::Edit(id), token, form, errors).await
        }
        Err(e) => Err(e),
    }
}

// POST /events/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let events = &state.service_context.event_service;
    events.authorize_manage(actor(&current_user), id).await?;
    check_csrf(&state, &current_user, &form.csrf_token).await?;

    events.delete(actor(&current_user), id).await?;

    let jar = flash::push(jar, FlashLevel::Success, "Event has been deleted!");
    Ok((jar, Redirect::to("/events/")).into_response())
}

enum FormPage {
    Create,
    Edit(i64),
}

async fn render_form(
    state: &AppState,
    current_user: &Option<Extension<CurrentUser>>,
    jar: CookieJar,
    page: FormPage,
    csrf_token: String,
    form: EventForm,
    errors: FieldErrors,
) -> Result<Response> {
    let departments = state.service_context.department_repo.list().await?;
    let departments = department_options(&departments, form.selected_department());
    let categories = category_options(&form.category);

    let (legend, action, cancel_href) = match page {
        FormPage::Create => (
            "New Event".to_string(),
            "/events/new".to_string(),
            "/events/".to_string(),
        ),
        FormPage::Edit(id) => (
            "Edit Event".to_string(),
            format!("/events/{}/edit", id),
            format!("/events/{}", id),
        ),
    };

    let (jar, flashes) = flash::take(jar);
    Ok((jar, HtmlTemplate(EventFormTemplate {
        current_user: user_info(current_user),
        flashes,
        legend,
        action,
        cancel_href,
        csrf_token,
        form,
        departments,
        categories,
        errors,
    })).into_response())
}
