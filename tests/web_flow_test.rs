mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use noticeboard::{
    api,
    config::Settings,
    domain::{Role, User},
    service::ServiceContext,
};
use tower::ServiceExt;

async fn test_app() -> anyhow::Result<(Router, Arc<ServiceContext>)> {
    let ctx = Arc::new(common::test_context().await?);
    let app = api::create_app(ctx.clone(), Arc::new(Settings::default()));
    Ok((app, ctx))
}

fn get(uri: &str, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::empty())?)
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> anyhow::Result<Request<Body>> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn location(response: &Response) -> Option<&str> {
    response.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

/// The full `Set-Cookie` value for the session cookie, attributes included.
fn session_set_cookie(response: &Response) -> Option<&str> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
}

fn session_cookie(response: &Response) -> Option<String> {
    session_set_cookie(response)
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

/// Signs `user` in directly and returns the cookie header plus the session id.
async fn sign_in(ctx: &ServiceContext, user: &User) -> anyhow::Result<(String, String)> {
    let (session, token) = ctx.auth_service.create_session(user.id, 1).await?;
    Ok((format!("session={}", token), session.id))
}

#[tokio::test]
async fn test_health_check() -> anyhow::Result<()> {
    let (app, _ctx) = test_app().await?;

    let response = app.oneshot(get("/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_anonymous_visitors() -> anyhow::Result<()> {
    let (app, _ctx) = test_app().await?;

    let landing = app.clone().oneshot(get("/", None)?).await?;
    assert_eq!(landing.status(), StatusCode::OK);

    let notices = app.clone().oneshot(get("/notices/", None)?).await?;
    assert_eq!(notices.status(), StatusCode::FORBIDDEN);

    let events = app.clone().oneshot(get("/events/", None)?).await?;
    assert_eq!(events.status(), StatusCode::FORBIDDEN);

    let bare = app.oneshot(get("/notices", None)?).await?;
    assert_eq!(bare.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(location(&bare), Some("/notices/"));

    Ok(())
}

#[tokio::test]
async fn test_register_then_login() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;

    let register = app.clone().oneshot(post_form(
        "/auth/register",
        None,
        "username=alice&email=alice%40example.com&password=secret123&password2=secret123",
    )?).await?;
    assert_eq!(register.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&register), Some("/auth/login"));

    let alice = ctx.user_service.authenticate("alice", "secret123").await?;
    assert_eq!(alice.map(|u| u.role), Some(Role::Student));

    // Same username again re-renders the form
    let duplicate = app.clone().oneshot(post_form(
        "/auth/register",
        None,
        "username=alice&email=other%40example.com&password=secret123&password2=secret123",
    )?).await?;
    assert_eq!(duplicate.status(), StatusCode::OK);

    let bad_login = app.clone().oneshot(post_form(
        "/auth/login",
        None,
        "username_or_email=alice&password=wrong",
    )?).await?;
    assert_eq!(bad_login.status(), StatusCode::OK);
    assert!(session_cookie(&bad_login).is_none());

    let login = app.clone().oneshot(post_form(
        "/auth/login",
        None,
        "username_or_email=alice%40example.com&password=secret123&next=%2Fevents%2F",
    )?).await?;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), Some("/events/"));
    let cookie = session_cookie(&login).expect("login sets a session cookie");

    let notices = app.oneshot(get("/notices/", Some(&cookie))?).await?;
    assert_eq!(notices.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_login_ignores_offsite_next() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    common::create_user(&ctx, "bob", Role::Publisher).await?;

    let login = app.oneshot(post_form(
        "/auth/login",
        None,
        "username_or_email=bob&password=password123&next=https%3A%2F%2Fevil.example%2F",
    )?).await?;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), Some("/"));

    Ok(())
}

#[tokio::test]
async fn test_students_cannot_post() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    let alice = common::create_user(&ctx, "alice", Role::Student).await?;
    let (cookie, session_id) = sign_in(&ctx, &alice).await?;
    let token = ctx.csrf_service.generate_token(&session_id).await?;

    let page = app.clone().oneshot(get("/notices/new", Some(&cookie))?).await?;
    assert_eq!(page.status(), StatusCode::FORBIDDEN);

    let body = format!("csrf_token={}&title=Hello&content=World&department_id=0", token);
    let post = app.oneshot(post_form("/notices/new", Some(&cookie), &body)?).await?;
    assert_eq!(post.status(), StatusCode::FORBIDDEN);

    assert!(ctx.notice_service.by_user(alice.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_publisher_posts_notice_with_csrf_token() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    let bob = common::create_user(&ctx, "bob", Role::Publisher).await?;
    let (cookie, session_id) = sign_in(&ctx, &bob).await?;

    let page = app.clone().oneshot(get("/notices/new", Some(&cookie))?).await?;
    assert_eq!(page.status(), StatusCode::OK);

    // Missing or wrong token
    let forged = app.clone().oneshot(post_form(
        "/notices/new",
        Some(&cookie),
        "csrf_token=forged&title=Exam+Schedule&content=Soon&department_id=0",
    )?).await?;
    assert_eq!(forged.status(), StatusCode::FORBIDDEN);

    let token = ctx.csrf_service.generate_token(&session_id).await?;

    // Validation failure re-renders the form
    let invalid = app.clone().oneshot(post_form(
        "/notices/new",
        Some(&cookie),
        &format!("csrf_token={}&title=&content=Soon&department_id=0", token),
    )?).await?;
    assert_eq!(invalid.status(), StatusCode::OK);
    assert!(ctx.notice_service.by_user(bob.id).await?.is_empty());

    let created = app.clone().oneshot(post_form(
        "/notices/new",
        Some(&cookie),
        &format!("csrf_token={}&title=Exam+Schedule&content=Soon&department_id=0", token),
    )?).await?;
    assert_eq!(created.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&created), Some("/notices/"));

    let posted = ctx.notice_service.by_user(bob.id).await?;
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].title, "Exam Schedule");

    let detail = app.oneshot(get(&format!("/notices/{}", posted[0].id), Some(&cookie))?).await?;
    assert_eq!(detail.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_non_owner_cannot_delete_event() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    let bob = common::create_user(&ctx, "bob", Role::Publisher).await?;
    let erin = common::create_user(&ctx, "erin", Role::Publisher).await?;

    let event = ctx.event_service.create(Some(&bob), noticeboard::domain::EventInput {
        title: "Robotics demo".to_string(),
        description: "Bring questions.".to_string(),
        event_date: chrono::Utc::now() + chrono::Duration::days(2),
        venue: "Lab 3".to_string(),
        category: None,
        department_id: None,
    }).await?;

    let (cookie, session_id) = sign_in(&ctx, &erin).await?;
    let token = ctx.csrf_service.generate_token(&session_id).await?;

    let response = app.clone().oneshot(post_form(
        &format!("/events/{}/delete", event.id),
        Some(&cookie),
        &format!("csrf_token={}", token),
    )?).await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (owner_cookie, owner_session) = sign_in(&ctx, &bob).await?;
    let owner_token = ctx.csrf_service.generate_token(&owner_session).await?;
    let deleted = app.oneshot(post_form(
        &format!("/events/{}/delete", event.id),
        Some(&owner_cookie),
        &format!("csrf_token={}", owner_token),
    )?).await?;
    assert_eq!(deleted.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&deleted), Some("/events/"));

    Ok(())
}

#[tokio::test]
async fn test_remember_me_extends_cookie_lifetime() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    common::create_user(&ctx, "bob", Role::Publisher).await?;

    let short = app.clone().oneshot(post_form(
        "/auth/login",
        None,
        "username_or_email=bob&password=password123",
    )?).await?;
    assert_eq!(short.status(), StatusCode::SEE_OTHER);
    let cookie = session_set_cookie(&short).expect("login sets a session cookie");
    assert!(cookie.contains("Max-Age=86400"), "{}", cookie);

    let remembered = app.oneshot(post_form(
        "/auth/login",
        None,
        "username_or_email=bob&password=password123&remember=y",
    )?).await?;
    assert_eq!(remembered.status(), StatusCode::SEE_OTHER);
    let cookie = session_set_cookie(&remembered).expect("login sets a session cookie");
    assert!(cookie.contains("Max-Age=2592000"), "{}", cookie);

    Ok(())
}

#[tokio::test]
async fn test_logout_with_and_without_session() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;

    let anonymous = app.clone().oneshot(get("/auth/logout", None)?).await?;
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&anonymous), Some("/"));
    assert_eq!(session_cookie(&anonymous).as_deref(), Some("session="));

    let stale = app.clone().oneshot(get("/auth/logout", Some("session=not-a-real-token"))?).await?;
    assert_eq!(stale.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&stale), Some("/"));

    let bob = common::create_user(&ctx, "bob", Role::Publisher).await?;
    let (cookie, _) = sign_in(&ctx, &bob).await?;
    let logout = app.clone().oneshot(get("/auth/logout", Some(&cookie))?).await?;
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logout), Some("/"));

    let after = app.oneshot(get("/notices/", Some(&cookie))?).await?;
    assert_eq!(after.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_unknown_and_malformed_ids_are_not_found() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    let bob = common::create_user(&ctx, "bob", Role::Publisher).await?;
    let (cookie, _) = sign_in(&ctx, &bob).await?;

    for uri in [
        "/notices/999",
        "/events/999",
        "/notices/999/edit",
        "/events/999/edit",
        "/notices/abc",
        "/events/abc",
        "/notices/abc/edit",
        "/events/1.5",
    ] {
        let response = app.clone().oneshot(get(uri, Some(&cookie))?).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }

    Ok(())
}

#[tokio::test]
async fn test_huge_page_number_lists_empty_page() -> anyhow::Result<()> {
    let (app, ctx) = test_app().await?;
    let bob = common::create_user(&ctx, "bob", Role::Publisher).await?;
    let (cookie, _) = sign_in(&ctx, &bob).await?;

    for uri in [
        "/notices/?page=9223372036854775807",
        "/events/?page=9223372036854775807",
        "/notices/?page=9223372036854775806&sort_by=title",
    ] {
        let response = app.clone().oneshot(get(uri, Some(&cookie))?).await?;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    Ok(())
}
