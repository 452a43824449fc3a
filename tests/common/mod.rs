#![allow(dead_code)]

use noticeboard::{
    domain::{NewUser, Role, User},
    error::AppError,
    service::ServiceContext,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// In-memory database with migrations applied. One connection, since each
/// `:memory:` connection is its own database.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await?;

    Ok(pool)
}

pub async fn test_context() -> anyhow::Result<ServiceContext> {
    Ok(ServiceContext::new(test_pool().await?))
}

pub async fn create_user(ctx: &ServiceContext, username: &str, role: Role) -> anyhow::Result<User> {
    let user = ctx.user_service.register(NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "password123".to_string(),
    }).await?;

    if role == Role::Student {
        return Ok(user);
    }
    Ok(ctx.user_service.set_role(username, role).await?)
}

pub fn is_forbidden<T>(result: &Result<T, AppError>) -> bool {
    matches!(result, Err(AppError::Forbidden))
}
