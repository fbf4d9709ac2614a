//! Refresh token repository.
//!
//! Refresh tokens are opaque random strings stored server-side so they can be
//! rotated and revoked. Expiry timestamps use SQLite's `datetime` text format
//! so they compare directly against `datetime('now')`.

use chrono::{Duration, Utc};

use super::{DbPool, SQL_NOW};
use crate::{Result, SkratimeError};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Stored refresh token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: i64,
    pub user_id: String,
    pub token: String,
    pub expires_at: String,
    pub created_at: String,
    /// Revocation timestamp (None if active).
    pub revoked_at: Option<String>,
}

/// New refresh token for creation.
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub user_id: String,
    pub token: String,
    pub expires_at: String,
}

impl NewRefreshToken {
    /// Issue a fresh random token for a user, valid for `ttl_days`.
    pub fn issue(user_id: impl Into<String>, ttl_days: u64) -> Self {
        let expires_at = Utc::now() + Duration::days(ttl_days as i64);
        Self {
            user_id: user_id.into(),
            token: format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple()),
            expires_at: expires_at.format(DATETIME_FORMAT).to_string(),
        }
    }
}

/// Repository for refresh token operations.
pub struct RefreshTokenRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> RefreshTokenRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Store a new refresh token.
    pub async fn create(&self, new_token: &NewRefreshToken) -> Result<RefreshToken> {
        let token = sqlx::query_as::<_, RefreshToken>(
            "INSERT INTO refresh_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)
             RETURNING id, user_id, token, expires_at, created_at, revoked_at",
        )
        .bind(&new_token.user_id)
        .bind(&new_token.token)
        .bind(&new_token.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(token)
    }

    /// Get a refresh token by token string, whatever its state.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let result = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, user_id, token, expires_at, created_at, revoked_at
             FROM refresh_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a token that is neither expired nor revoked.
    pub async fn get_valid_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let sql = format!(
            "SELECT id, user_id, token, expires_at, created_at, revoked_at
             FROM refresh_tokens
             WHERE token = $1 AND revoked_at IS NULL AND expires_at > {SQL_NOW}"
        );
        let result = sqlx::query_as::<_, RefreshToken>(&sql)
            .bind(token)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Revoke `old` and store `replacement` in one transaction.
    ///
    /// Returns false, storing nothing, when `old` was not valid.
    pub async fn rotate(&self, old: &str, replacement: &NewRefreshToken) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE refresh_tokens SET revoked_at = {SQL_NOW}
             WHERE token = $1 AND user_id = $2 AND revoked_at IS NULL AND expires_at > {SQL_NOW}"
        );
        let revoked = sqlx::query(&sql)
            .bind(old)
            .bind(&replacement.user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if revoked == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO refresh_tokens (user_id, token, expires_at) VALUES ($1, $2, $3)")
            .bind(&replacement.user_id)
            .bind(&replacement.token)
            .bind(&replacement.expires_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Revoke a refresh token.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let sql = format!(
            "UPDATE refresh_tokens SET revoked_at = {SQL_NOW} WHERE token = $1 AND revoked_at IS NULL"
        );
        let result = sqlx::query(&sql)
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete expired and revoked tokens.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let sql = format!(
            "DELETE FROM refresh_tokens WHERE expires_at < {SQL_NOW} OR revoked_at IS NOT NULL"
        );
        let result = sqlx::query(&sql)
            .execute(self.pool)
            .await
            .map_err(|e| SkratimeError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
