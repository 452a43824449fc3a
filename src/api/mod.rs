pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    Router,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    error::AppError,
    service::ServiceContext,
    web,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, settings);

    Router::new()
        .route("/health", get(handlers::root::health_check))
        .nest_service("/static", ServeDir::new("static"))

        // HTML pages
        .merge(web::create_web_routes())

        // Every request gets its actor resolved from the session cookie
        .layer(axum::middleware::from_fn_with_state(
            app_state.clone(),
            middleware::auth::optional_auth,
        ))
        .with_state(app_state)

        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    AppError::Internal("request handler panicked".to_string()).into_response()
}
