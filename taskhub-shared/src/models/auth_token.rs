/// Auth token model and database operations
///
/// Each user holds at most one opaque bearer token. The token value itself
/// is the primary key, so resolving a request credential is a single
/// indexed lookup. Tokens are stored verbatim: issuing is idempotent and
/// must hand back the existing value, which one-way storage cannot do.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     token VARCHAR(40) PRIMARY KEY,
///     user_id UUID NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::token::generate_token;

/// Auth token model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuthToken {
    /// The opaque token value (40 hex chars)
    pub token: String,

    /// User this token authenticates
    pub user_id: Uuid,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl AuthToken {
    /// Returns the user's token, creating one if none exists
    ///
    /// Calling this twice without an intervening revocation returns the
    /// same token value.
    pub async fn get_or_create(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        if let Some(existing) = Self::find_by_user(pool, user_id).await? {
            return Ok(existing);
        }

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (token, user_id)
            VALUES ($1, $2)
            RETURNING token, user_id, created_at
            "#,
        )
        .bind(generate_token())
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(token)
    }

    /// Finds the token held by a user
    pub async fn find_by_user(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT token, user_id, created_at
            FROM auth_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(token)
    }

    /// Finds a token row by its value
    pub async fn find_by_token(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, AuthToken>(
            r#"
            SELECT token, user_id, created_at
            FROM auth_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Deletes the token held by a user
    ///
    /// Returns true if a token was deleted, false if the user had none.
    pub async fn delete_by_user(pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
