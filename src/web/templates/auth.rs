use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    auth::{safe_redirect_target, AuthService, SESSION_COOKIE},
    domain::NewUser,
    error::{AppError, FieldErrors, Result},
    web::{
        flash::{self, Flash, FlashLevel},
        templates::{HtmlTemplate, UserInfo},
    },
};

pub const INVALID_CREDENTIALS: &str = "Invalid username/email or password. Please try again.";

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub username_or_email: String,
    pub remember: bool,
    pub next: String,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<UserInfo>,
    pub flashes: Vec<Flash>,
    pub username: String,
    pub email: String,
    pub errors: FieldErrors,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub username_or_email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    pub remember: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 3, max = 35, message = "Username must be between 3 and 35 characters."))]
    pub username: String,
    #[serde(default)]
    #[validate(
        email(message = "Enter a valid email."),
        length(max = 120, message = "Email must be at most 120 characters.")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long."))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub password2: String,
}

impl RegisterForm {
    /// Syntactic checks only; duplicates are detected by the user service.
    pub fn check(&self) -> std::result::Result<NewUser, FieldErrors> {
        let form = RegisterForm {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            password2: self.password2.clone(),
        };
        form.validate().map_err(FieldErrors::from)?;

        Ok(NewUser {
            username: form.username,
            email: form.email,
            password: form.password,
        })
    }
}

// GET /auth/login
pub async fn login_page(
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> Response {
    if current_user.is_some() {
        return Redirect::to("/").into_response();
    }

    let (jar, flashes) = flash::take(jar);
    (jar, HtmlTemplate(LoginTemplate {
        current_user: None,
        flashes,
        username_or_email: String::new(),
        remember: false,
        next: query.next.unwrap_or_default(),
        errors: FieldErrors::new(),
    })).into_response()
}

// POST /auth/login
pub async fn login_handler(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if current_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let identifier = form.username_or_email.trim().to_string();
    let (jar, mut flashes) = flash::take(jar);

    if let Err(errors) = form.validate() {
        return Ok((jar, HtmlTemplate(LoginTemplate {
            current_user: None,
            flashes,
            username_or_email: identifier,
            remember: form.remember.is_some(),
            next: form.next.unwrap_or_default(),
            errors: errors.into(),
        })).into_response());
    }

    let user = state.service_context.user_service
        .authenticate(&identifier, &form.password)
        .await?;

    let Some(user) = user else {
        tracing::warn!("Failed login attempt for {}", identifier);
        flashes.push(Flash::danger(INVALID_CREDENTIALS));
        return Ok((jar, HtmlTemplate(LoginTemplate {
            current_user: None,
            flashes,
            username_or_email: identifier,
            remember: form.remember.is_some(),
            next: form.next.unwrap_or_default(),
            errors: FieldErrors::new(),
        })).into_response());
    };

    let hours = state.settings.auth.session_hours(form.remember.is_some());
    let (_session, token) = state.service_context.auth_service
        .create_session(user.id, hours)
        .await?;

    tracing::info!("User {} logged in", user.username);

    let jar = jar.add(AuthService::create_session_cookie(
        &token,
        state.settings.auth.secure_cookies,
        hours,
    ));
    let jar = flash::push(jar, FlashLevel::Success, "Logged in successfully!");
    let target = safe_redirect_target(form.next.as_deref());

    Ok((jar, Redirect::to(&target)).into_response())
}

// GET /auth/logout
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Response> {
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    if let Some(token) = token.filter(|t| !t.is_empty()) {
        let ctx = &state.service_context;
        if let Some(session_id) = ctx.auth_service.invalidate_session(&token).await? {
            ctx.csrf_service.delete_token(&session_id).await?;
            tracing::info!("Session {} ended", session_id);
        }
    }

    let jar = jar.add(AuthService::create_logout_cookie());
    let jar = flash::push(jar, FlashLevel::Info, "You have been logged out.");
    Ok((jar, Redirect::to("/")).into_response())
}

// GET /auth/register
pub async fn register_page(
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
) -> Response {
    if current_user.is_some() {
        return Redirect::to("/").into_response();
    }

    let (jar, flashes) = flash::take(jar);
    (jar, HtmlTemplate(RegisterTemplate {
        current_user: None,
        flashes,
        username: String::new(),
        email: String::new(),
        errors: FieldErrors::new(),
    })).into_response()
}

// POST /auth/register
pub async fn register_handler(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if current_user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let result = match form.check() {
        Ok(new_user) => state.service_context.user_service.register(new_user).await,
        Err(errors) => Err(AppError::Validation(errors)),
    };

    match result {
        Ok(_) => {
            let jar = flash::push(
                jar,
                FlashLevel::Success,
                "Congratulations, you are now a registered user! Please log in.",
            );
            Ok((jar, Redirect::to("/auth/login")).into_response())
        }
        Err(AppError::Validation(errors)) => {
            let (jar, flashes) = flash::take(jar);
            Ok((jar, HtmlTemplate(RegisterTemplate {
                current_user: None,
                flashes,
                username: form.username.trim().to_string(),
                email: form.email.trim().to_string(),
                errors,
            })).into_response())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, email: &str, password: &str, password2: &str) -> RegisterForm {
        RegisterForm {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password2: password2.to_string(),
        }
    }

    #[test]
    fn valid_registration_form_yields_new_user() {
        let user = form(" alice ", "alice@college.edu", "secret1", "secret1").check().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@college.edu");
    }

    #[test]
    fn registration_form_reports_each_bad_field() {
        let errors = form("al", "not-an-email", "123", "456").check().unwrap_err();
        assert_eq!(errors.get("username"), ["Username must be between 3 and 35 characters."]);
        assert_eq!(errors.get("email"), ["Enter a valid email."]);
        assert_eq!(errors.get("password"), ["Password must be at least 6 characters long."]);
        assert_eq!(errors.get("password2"), ["Passwords must match."]);
    }

    #[test]
    fn username_length_is_bounded() {
        let long = "x".repeat(36);
        assert!(form(&long, "a@b.edu", "secret1", "secret1").check().is_err());
        let max = "x".repeat(35);
        assert!(form(&max, "a@b.edu", "secret1", "secret1").check().is_ok());
    }

    #[test]
    fn login_form_requires_both_fields() {
        let empty = LoginForm::default();
        let errors: FieldErrors = empty.validate().unwrap_err().into();
        assert!(errors.has("username_or_email"));
        assert!(errors.has("password"));
    }
}
