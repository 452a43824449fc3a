use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::Result,
    web::{
        flash::{self, Flash},
        templates::{HtmlTemplate, UserInfo},
    },
};

use super::{
    actor, user_info, HOME_LIMIT,
    events::EventRowView,
    notices::NoticeRowView,
};

#[derive(Template)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub notices: Vec<NoticeRowView>,
    pub events: Vec<EventRowView>,
}

// GET /
pub async fn index(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
) -> Result<Response> {
    let (jar, flashes) = flash::take(jar);

    if actor(&current_user).is_none() {
        return Ok((jar, HtmlTemplate(LandingTemplate {
            current_user: None,
            flashes,
        })).into_response());
    }

    let ctx = &state.service_context;
    let notices = ctx.notice_service.recent(HOME_LIMIT).await?;
    let events = ctx.event_service.upcoming(HOME_LIMIT).await?;

    Ok((jar, HtmlTemplate(HomeTemplate {
        current_user: user_info(&current_user),
        flashes,
        notices: notices.into_iter().map(NoticeRowView::from).collect(),
        events: events.into_iter().map(EventRowView::from).collect(),
    })).into_response())
}
