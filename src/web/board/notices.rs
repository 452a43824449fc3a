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
    domain::{ListQuery, ListingParams, NoticeDetail, NoticeSummary},
    error::{AppError, FieldErrors, Result},
    web::{
        flash::{self, Flash, FlashLevel},
        templates::{HtmlTemplate, UserInfo},
    },
};

use super::{
    actor, check_csrf, department_label, department_options, format_date, issue_csrf,
    select_options, user_info,
    forms::{DeleteForm, NoticeForm},
    DepartmentOption, Pagination, RecordId, SelectOption,
};

const SORT_KEYS: [(&str, &str); 3] = [
    ("date", "Date"),
    ("title", "Title"),
    ("department", "Department"),
];

const SORT_ORDERS: [(&str, &str); 2] = [
    ("desc", "Newest first"),
    ("asc", "Oldest first"),
];

const EXCERPT_CHARS: usize = 200;

pub struct NoticeRowView {
    pub id: i64,
    pub title: String,
    pub excerpt: String,
    pub issue_date: String,
    pub publisher: String,
    pub department: String,
}

impl From<NoticeSummary> for NoticeRowView {
    fn from(summary: NoticeSummary) -> Self {
        let notice = summary.notice;
        let mut excerpt: String = notice.content.chars().take(EXCERPT_CHARS).collect();
        if notice.content.chars().count() > EXCERPT_CHARS {
            excerpt.push_str("...");
        }

        Self {
            id: notice.id,
            title: notice.title,
            excerpt,
            issue_date: format_date(notice.issue_date),
            publisher: summary.publisher,
            department: department_label(summary.department),
        }
    }
}

pub struct NoticeDetailView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub issue_date: String,
    pub publisher: String,
    pub department: String,
    pub last_editor: Option<String>,
    pub last_edited_at: Option<String>,
    pub media_files: Vec<String>,
}

impl From<NoticeDetail> for NoticeDetailView {
    fn from(detail: NoticeDetail) -> Self {
        let notice = detail.notice;
        Self {
            id: notice.id,
            title: notice.title,
            content: notice.content,
            issue_date: format_date(notice.issue_date),
            publisher: detail.publisher,
            department: department_label(detail.department),
            last_editor: detail.last_editor,
            last_edited_at: notice.last_edited_at.map(format_date),
            media_files: detail.media_files.into_iter().map(|m| m.filename).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "notices/list.html")]
pub struct NoticeListTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub notices: Vec<NoticeRowView>,
    pub pagination: Pagination,
    pub params: ListingParams,
    pub departments: Vec<DepartmentOption>,
    pub sort_keys: Vec<SelectOption>,
    pub sort_orders: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "notices/detail.html")]
pub struct NoticeDetailTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub notice: NoticeDetailView,
    pub can_manage: bool,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "notices/form.html")]
pub struct NoticeFormTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub legend: String,
    pub action: String,
    pub cancel_href: String,
    pub csrf_token: String,
    pub form: NoticeForm,
    pub departments: Vec<DepartmentOption>,
    pub errors: FieldErrors,
}

// GET /notices/
pub async fn list(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Response> {
    gate::require_authenticated(actor(&current_user))?;

    let listing = state.service_context.listing_service.notices(&query).await;

    let (jar, mut flashes) = flash::take(jar);
    flashes.extend(listing.warnings.into_iter().map(Flash::warning));

    let pagination = Pagination::new(&listing.page, &listing.params, "/notices/");
    let departments = department_options(&listing.departments, listing.params.department_id);
    let sort_keys = select_options(&SORT_KEYS, &listing.params.sort_by);
    let sort_orders = select_options(&SORT_ORDERS, &listing.params.sort_order);

    Ok((jar, HtmlTemplate(NoticeListTemplate {
        current_user: user_info(&current_user),
        flashes,
        notices: listing.page.items.into_iter().map(NoticeRowView::from).collect(),
        pagination,
        params: listing.params,
        departments,
        sort_keys,
        sort_orders,
    })).into_response())
}

// GET /notices/:id
pub async fn detail(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
) -> Result<Response> {
    let detail = state.service_context.notice_service
        .detail(actor(&current_user), id)
        .await?;

    let can_manage = actor(&current_user)
        .map(|user| gate::can_manage(user, &detail.notice))
        .unwrap_or(false);
    let csrf_token = if can_manage {
        issue_csrf(&state, &current_user).await?
    } else {
        String::new()
    };

    let (jar, flashes) = flash::take(jar);
    Ok((jar, HtmlTemplate(NoticeDetailTemplate {
        current_user: user_info(&current_user),
        flashes,
        notice: detail.into(),
        can_manage,
        csrf_token,
    })).into_response())
}

// GET /notices/new
pub async fn new_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
) -> Result<Response> {
    state.service_context.notice_service.authorize_create(actor(&current_user))?;
    let csrf_token = issue_csrf(&state, &current_user).await?;

    render_form(&state, &current_user, jar, FormPage::Create, csrf_token, NoticeForm::default(), FieldErrors::new()).await
}

// POST /notices/new
pub async fn create(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Form(form): Form<NoticeForm>,
) -> Result<Response> {
    let notices = &state.service_context.notice_service;
    notices.authorize_create(actor(&current_user))?;
    check_csrf(&state, &current_user, &form.csrf_token).await?;

    let result = match form.to_input() {
        Ok(input) => notices.create(actor(&current_user), input).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(_) => {
            let jar = flash::push(jar, FlashLevel::Success, "Your notice has been posted!");
            Ok((jar, Redirect::to("/notices/")).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let token = form.csrf_token.clone();
            render_form(&state, &current_user, jar, FormPage::Create, token, form, errors).await
        }
        Err(e) => Err(e),
    }
}

// GET /notices/:id/edit
pub async fn edit_page(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
) -> Result<Response> {
    let notice = state.service_context.notice_service
        .authorize_manage(actor(&current_user), id)
        .await?;
    let csrf_token = issue_csrf(&state, &current_user).await?;

    let form = NoticeForm::from_notice(&notice);
    render_form(&state, &current_user, jar, FormPage::Edit(id), csrf_token, form, FieldErrors::new()).await
}

// POST /notices/:id/edit
pub async fn update(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
    Form(form): Form<NoticeForm>,
) -> Result<Response> {
    let notices = &state.service_context.notice_service;
    notices.authorize_manage(actor(&current_user), id).await?;
    check_csrf(&state, &current_user, &form.csrf_token).await?;

    let result = match form.to_input() {
        Ok(input) => notices.update(actor(&current_user), id, input).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(notice) => {
            let jar = flash::push(jar, FlashLevel::Success, "Your notice has been updated!");
            Ok((jar, Redirect::to(&format!("/notices/{}", notice.id))).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let token = form.csrf_token.clone();
            render_form(&state, &current_user, jar, FormPage::Edit(id), token, form, errors).await
        }
        Err(e) => Err(e),
    }
}

// POST /notices/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    RecordId(id): RecordId,
    Form(form): Form<DeleteForm>,
) -> Result<Response> {
    let notices = &state.service_context.notice_service;
    notices.authorize_manage(actor(&current_user), id).await?;
    check_csrf(&state, &current_user, &form.csrf_token).await?;

    notices.delete(actor(&current_user), id).await?;

    let jar = flash::push(jar, FlashLevel::Success, "Notice has been deleted!");
    Ok((jar, Redirect::to("/notices/")).into_response())
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
    form: NoticeForm,
    errors: FieldErrors,
) -> Result<Response> {
    let departments = state.service_context.department_repo.list().await?;
    let departments = department_options(&departments, form.selected_department());

    let (legend, action, cancel_href) = match page {
        FormPage::Create => (
            "New Notice".to_string(),
            "/notices/new".to_string(),
            "/notices/".to_string(),
        ),
        FormPage::Edit(id) => (
            "Edit Notice".to_string(),
            format!("/notices/{}/edit", id),
            format!("/notices/{}", id),
        ),
    };

    let (jar, flashes) = flash::take(jar);
    Ok((jar, HtmlTemplate(NoticeFormTemplate {
        current_user: user_info(current_user),
        flashes,
        legend,
        action,
        cancel_href,
        csrf_token,
        form,
        departments,
        errors,
    })).into_response())
}
