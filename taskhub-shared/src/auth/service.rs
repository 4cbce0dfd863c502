/// Auth service: credential checks and the token lifecycle
///
/// Every request outside registration and login authenticates by bearer
/// token. The flow is:
///
/// ```text
/// authenticate(username, password) -> User
/// issue_token(user_id)             -> AuthToken   (get-or-create, idempotent)
/// resolve_token(token)             -> User        (per request)
/// revoke_token(user_id)            -> ()          (logout)
/// ```
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::service;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = service::authenticate(&pool, "alice", "her password").await?;
/// let token = service::issue_token(&pool, user.id).await?;
///
/// let caller = service::resolve_token(&pool, &token.token).await?;
/// assert_eq!(caller.id, user.id);
///
/// service::revoke_token(&pool, user.id).await?;
/// # Ok(())
/// # }
/// ```

use sqlx::PgPool;
use uuid::Uuid;

use super::password::{self, PasswordError};
use crate::models::{auth_token::AuthToken, user::User};

/// Error type for authentication operations
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Username unknown or password wrong
    ///
    /// Deliberately one variant for both, so responses don't reveal which
    /// usernames exist.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Credentials matched but the account is deactivated
    #[error("User account is disabled")]
    AccountDisabled,

    /// Bearer token not recognized
    #[error("Invalid authentication token")]
    InvalidToken,

    /// Revocation requested but the user holds no token
    #[error("No active session")]
    NoActiveSession,

    /// Password hashing/verification failure
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Checks a username/password pair
///
/// # Errors
///
/// - `InvalidCredentials` if the username is unknown or the password does
///   not match the stored hash
/// - `AccountDisabled` if the credentials match but the account is inactive
pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<User, AuthError> {
    let user = User::find_by_username(pool, username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !password::verify_password(password, &user.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }

    Ok(user)
}

/// Returns the user's bearer token, creating one if none exists
///
/// Idempotent: a second call without an intervening [`revoke_token`]
/// returns the same token value.
pub async fn issue_token(pool: &PgPool, user_id: Uuid) -> Result<AuthToken, AuthError> {
    let token = AuthToken::get_or_create(pool, user_id).await?;
    Ok(token)
}

/// Resolves a bearer token to its user
///
/// # Errors
///
/// - `InvalidToken` if the token is unknown
/// - `AccountDisabled` if the token's user has been deactivated
pub async fn resolve_token(pool: &PgPool, token: &str) -> Result<User, AuthError> {
    let row = AuthToken::find_by_token(pool, token)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    // The FK guarantees the user row exists while the token does
    let user = User::find_by_id(pool, row.user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;

    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }

    Ok(user)
}

/// Deletes the user's bearer token
///
/// # Errors
///
/// `NoActiveSession` if the user holds no token.
pub async fn revoke_token(pool: &PgPool, user_id: Uuid) -> Result<(), AuthError> {
    let deleted = AuthToken::delete_by_user(pool, user_id).await?;

    if deleted {
        Ok(())
    } else {
        Err(AuthError::NoActiveSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid username or password"
        );
        assert_eq!(
            AuthError::AccountDisabled.to_string(),
            "User account is disabled"
        );
        assert_eq!(AuthError::NoActiveSession.to_string(), "No active session");
    }

    // authenticate/issue/resolve/revoke against a live database are covered
    // by taskhub-api/tests/integration_test.rs
}
