mod common;

use noticeboard::{
    auth::AuthService,
    domain::{NewUser, Role, EMAIL_TAKEN, USERNAME_TAKEN},
    error::AppError,
    repository::{SqliteUserRepository, UserRepository},
};

#[tokio::test]
async fn test_user_crud() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let repo = SqliteUserRepository::new(pool.clone());

    let new_user = NewUser {
        username: "testuser".to_string(),
        email: "test@example.com".to_string(),
        password: "secure_password123".to_string(),
    };
    let hash = AuthService::hash_password(&new_user.password)?;

    let user = repo.create(&new_user, &hash).await?;
    assert_eq!(user.username, "testuser");
    assert_eq!(user.email, "test@example.com");
    assert_eq!(user.role, Role::Student);
    assert_eq!(user.department_id, None);

    // Lookups
    let found = repo.find_by_id(user.id).await?;
    assert_eq!(found.map(|u| u.id), Some(user.id));

    let by_name = repo.find_by_username_or_email("testuser").await?;
    assert_eq!(by_name.map(|u| u.id), Some(user.id));

    let by_email = repo.find_by_username_or_email("test@example.com").await?;
    assert_eq!(by_email.map(|u| u.id), Some(user.id));

    assert!(repo.find_by_username("nobody").await?.is_none());

    // Stored hash verifies
    let stored = repo.password_hash(user.id).await?;
    assert!(stored.is_some_and(|h| AuthService::verify_password("secure_password123", &h)));

    // Role change
    let promoted = repo.set_role(user.id, Role::Publisher).await?;
    assert_eq!(promoted.role, Role::Publisher);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_registration_reports_both_fields() -> anyhow::Result<()> {
    let ctx = common::test_context().await?;
    common::create_user(&ctx, "alice", Role::Student).await?;

    let result = ctx.user_service.register(NewUser {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        password: "password123".to_string(),
    }).await;

    match result {
        Err(AppError::Validation(errors)) => {
            assert_eq!(errors.get("username"), [USERNAME_TAKEN.to_string()]);
            assert_eq!(errors.get("email"), [EMAIL_TAKEN.to_string()]);
        }
        other => panic!("expected validation error, got {:?}", other.map(|u| u.username)),
    }

    Ok(())
}

#[tokio::test]
async fn test_authenticate_by_username_or_email() -> anyhow::Result<()> {
    let ctx = common::test_context().await?;
    let bob = common::create_user(&ctx, "bob", Role::Publisher).await?;

    let by_name = ctx.user_service.authenticate("bob", "password123").await?;
    assert_eq!(by_name.map(|u| u.id), Some(bob.id));

    let by_email = ctx.user_service.authenticate("bob@example.com", "password123").await?;
    assert_eq!(by_email.map(|u| u.role), Some(Role::Publisher));

    assert!(ctx.user_service.authenticate("bob", "wrong-password").await?.is_none());
    assert!(ctx.user_service.authenticate("nobody", "password123").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_password_hashing() -> anyhow::Result<()> {
    let password = "my_secure_password";
    let hash = AuthService::hash_password(password)?;

    assert!(AuthService::verify_password(password, &hash));
    assert!(!AuthService::verify_password("wrong_password", &hash));
    assert!(!AuthService::verify_password(password, "not-a-hash"));

    Ok(())
}

#[tokio::test]
async fn test_session_lifecycle() -> anyhow::Result<()> {
    let ctx = common::test_context().await?;
    let user = common::create_user(&ctx, "dave", Role::Student).await?;

    let (session, token) = ctx.auth_service.create_session(user.id, 24).await?;
    let found = ctx.auth_service.validate_session(&token).await?;
    assert_eq!(found.map(|s| s.user_id), Some(user.id));

    let ended = ctx.auth_service.invalidate_session(&token).await?;
    assert_eq!(ended, Some(session.id));
    assert!(ctx.auth_service.validate_session(&token).await?.is_none());

    // Already-expired sessions never validate and are purged
    let (_expired, stale_token) = ctx.auth_service.create_session(user.id, -1).await?;
    assert!(ctx.auth_service.validate_session(&stale_token).await?.is_none());
    assert_eq!(ctx.auth_service.cleanup_expired_sessions().await?, 1);

    Ok(())
}
