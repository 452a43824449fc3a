use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{SaltString, rand_core::OsRng};
use chrono::{Duration, Utc};
use cookie::{Cookie, SameSite};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::error::{AppError, Result};

pub mod csrf;
pub mod gate;
pub mod session;

use session::{Session, SessionStore};
pub use csrf::CsrfService;

pub const SESSION_COOKIE: &str = "session";

pub struct AuthService {
    session_store: SessionStore,
}

impl AuthService {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            session_store: SessionStore::new(pool),
        }
    }

    /// A stored hash that cannot be parsed verifies as false.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Stored password hash is malformed: {}", e);
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        Ok(password_hash.to_string())
    }

    pub async fn create_session(&self, user_id: i64, duration_hours: i64) -> Result<(Session, String)> {
        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(duration_hours);

        let session = self.session_store
            .create(user_id, &token, expires_at)
            .await?;

        Ok((session, token))
    }

    pub async fn validate_session(&self, token: &str) -> Result<Option<Session>> {
        self.session_store.find_by_token(token).await
    }

    /// Deletes the session for `token`; returns its id when there was one.
    pub async fn invalidate_session(&self, token: &str) -> Result<Option<String>> {
        self.session_store.delete_by_token(token).await
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        self.session_store.cleanup_expired().await
    }

    pub fn create_session_cookie(token: &str, secure: bool, max_age_hours: i64) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(secure)
            .max_age(cookie::time::Duration::hours(max_age_hours))
            .build()
    }

    pub fn create_logout_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

/// Accepts a post-login target only if it is a path on this site.
pub fn safe_redirect_target(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(target)
            if target.starts_with('/')
                && !target.starts_with("//")
                && !target.starts_with("/\\")
                && !target.contains("://") =>
        {
            target.to_string()
        }
        _ => "/".to_string(),
    }
}

pub(crate) fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = AuthService::hash_password("s3cret!").unwrap();
        assert_ne!(hash, "s3cret!");
        assert!(AuthService::verify_password("s3cret!", &hash));
        assert!(!AuthService::verify_password("wrong", &hash));
    }

    #[test]
    fn test_malformed_hash_does_not_verify() {
        assert!(!AuthService::verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_generation() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert_ne!(hash_token(&token), token);
        assert_eq!(hash_token(&token), hash_token(&token));
    }

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(Some("/notices/?page=2")), "/notices/?page=2");
        assert_eq!(safe_redirect_target(Some("/events/3")), "/events/3");
        assert_eq!(safe_redirect_target(Some("//evil.example.com")), "/");
        assert_eq!(safe_redirect_target(Some("/\\evil.example.com")), "/");
        assert_eq!(safe_redirect_target(Some("https://evil.example.com/")), "/");
        assert_eq!(safe_redirect_target(Some("/redirect?to=http://x")), "/");
        assert_eq!(safe_redirect_target(Some("")), "/");
        assert_eq!(safe_redirect_target(None), "/");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = AuthService::create_session_cookie("abc", true, 24);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(cookie::time::Duration::hours(24)));
    }
}
