use std::sync::Arc;

use crate::{
    auth::AuthService,
    domain::*,
    error::{AppError, FieldErrors, Result},
    repository::UserRepository,
};

pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    /// Creates a student account. Duplicate username and email are reported together.
    pub async fn register(&self, new_user: NewUser) -> Result<User> {
        let mut errors = FieldErrors::new();

        if self.repo.find_by_username(&new_user.username).await?.is_some() {
            errors.add("username", USERNAME_TAKEN);
        }

        if self.repo.find_by_email(&new_user.email).await?.is_some() {
            errors.add("email", EMAIL_TAKEN);
        }

        errors.into_result()?;

        let password_hash = AuthService::hash_password(&new_user.password)?;
        let user = self.repo.create(&new_user, &password_hash).await?;

        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Returns the user only when the identifier exists and the password matches.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.repo.find_by_username_or_email(identifier).await? else {
            return Ok(None);
        };

        let Some(hash) = self.repo.password_hash(user.id).await? else {
            return Ok(None);
        };

        if AuthService::verify_password(password, &hash) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        self.repo.find_by_id(id).await
    }

    pub async fn set_role(&self, username: &str, role: Role) -> Result<User> {
        let user = self.repo.find_by_username(username).await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

        let updated = self.repo.set_role(user.id, role).await?;
        tracing::info!("User {} is now {}", updated.username, updated.role);
        Ok(updated)
    }
}
