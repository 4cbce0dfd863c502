/// Authentication for TaskHub
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`token`]: Opaque bearer token generation
/// - [`service`]: Credential checks and the token lifecycle
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::auth::{password, service};
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let hash = password::hash_password("user_password")?;
///
/// let user = service::authenticate(&pool, "alice", "user_password").await?;
/// let token = service::issue_token(&pool, user.id).await?;
/// # Ok(())
/// # }
/// ```

pub mod password;
pub mod service;
pub mod token;
