pub mod board;
pub mod flash;
pub mod templates;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use crate::api::state::AppState;

pub fn create_web_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(board::home::index))

        // Auth pages
        .route("/auth/login", get(templates::auth::login_page).post(templates::auth::login_handler))
        .route("/auth/logout", get(templates::auth::logout_handler))
        .route("/auth/register", get(templates::auth::register_page).post(templates::auth::register_handler))

        // Notices
        .route("/notices", get(|| async { Redirect::permanent("/notices/") }))
        .route("/notices/", get(board::notices::list))
        .route("/notices/new", get(board::notices::new_page).post(board::notices::create))
        .route("/notices/:id", get(board::notices::detail))
        .route("/notices/:id/edit", get(board::notices::edit_page).post(board::notices::update))
        .route("/notices/:id/delete", post(board::notices::delete))

        // Events
        .route("/events", get(|| async { Redirect::permanent("/events/") }))
        .route("/events/", get(board::events::list))
        .route("/events/new", get(board::events::new_page).post(board::events::create))
        .route("/events/:id", get(board::events::detail))
        .route("/events/:id/edit", get(board::events::edit_page).post(board::events::update))
        .route("/events/:id/delete", post(board::events::delete))
}
