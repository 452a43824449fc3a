use sqlx::SqlitePool;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};

use super::{generate_token, hash_token};

/// Per-session form tokens. Only the SHA-256 hash is stored.
pub struct CsrfService {
    pool: SqlitePool,
}

impl CsrfService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issues a fresh token for the session, replacing any previous one.
    pub async fn generate_token(&self, session_id: &str) -> Result<String> {
        let token = generate_token();
        let token_hash = hash_token(&token);

        sqlx::query(
            r#"
            INSERT INTO csrf_tokens (session_id, token_hash, created_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(session_id) DO UPDATE SET
                token_hash = excluded.token_hash,
                created_at = CURRENT_TIMESTAMP
            "#
        )
        .bind(session_id)
        .bind(&token_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(token)
    }

    pub async fn validate_token(&self, session_id: &str, token: &str) -> Result<bool> {
        let stored = sqlx::query_scalar::<_, String>(
            "SELECT token_hash FROM csrf_tokens WHERE session_id = ?"
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(match stored {
            Some(stored) => hashes_match(&stored, &hash_token(token)),
            None => false,
        })
    }

    /// Fails with `Forbidden` unless `token` matches the session's token.
    pub async fn verify(&self, session_id: &str, token: Option<&str>) -> Result<()> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            tracing::warn!("Missing CSRF token for session {}", session_id);
            return Err(AppError::Forbidden);
        };

        if self.validate_token(session_id, token).await? {
            Ok(())
        } else {
            tracing::warn!("CSRF token mismatch for session {}", session_id);
            Err(AppError::Forbidden)
        }
    }

    pub async fn delete_token(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM csrf_tokens WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

fn hashes_match(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
