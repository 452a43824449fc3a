use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::User,
};

/// The authenticated actor of a request and the session it came in on.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: String,
}

/// Resolves the session cookie, if any, into a `CurrentUser` extension.
/// Requests without a live session pass through anonymously; each handler
/// applies its own gate checks.
pub async fn optional_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(session_cookie) = jar.get(SESSION_COOKIE) {
        let ctx = &state.service_context;

        match ctx.auth_service.validate_session(session_cookie.value()).await {
            Ok(Some(session)) => match ctx.user_service.find_by_id(session.user_id).await {
                Ok(Some(user)) => {
                    request.extensions_mut().insert(CurrentUser {
                        user,
                        session_id: session.id,
                    });
                }
                Ok(None) => {}
                Err(e) => tracing::error!("Failed to load session user: {}", e),
            },
            Ok(None) => {}
            Err(e) => tracing::error!("Failed to validate session: {}", e),
        }
    }

    next.run(request).await
}
