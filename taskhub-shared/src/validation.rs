/// Validation engine
///
/// Explicit validation functions for task and user input, composed in a
/// fixed order: field-level rules first, cross-field rules second. Each
/// function returns the cleaned value or a [`ValidationError`]; nothing
/// here touches the database except the duplicate-email lookup in
/// [`validate_user_registration`].
///
/// # Example
///
/// ```
/// use taskhub_shared::validation::validate_task_title;
///
/// assert_eq!(validate_task_title("  Buy milk  ").unwrap(), "Buy milk");
/// assert!(validate_task_title("   ").is_err());
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::user::User;

/// Minimum accepted password length (characters)
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Error type for validation failures
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A single field failed a field-level rule
    #[error("{field}: {message}")]
    InvalidField {
        /// Field that failed validation
        field: &'static str,
        /// Human-readable reason
        message: String,
    },

    /// Email already registered (case-insensitive match)
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// Password shorter than [`MIN_PASSWORD_LENGTH`]
    #[error("Password must be at least 8 characters long")]
    WeakPassword,

    /// Password and confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Database failure during the duplicate-email lookup
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn invalid_field(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field,
        message: message.into(),
    }
}

/// Validates and trims a task title
///
/// # Errors
///
/// `InvalidField` if the title is empty or whitespace-only after trimming.
pub fn validate_task_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();

    if trimmed.is_empty() {
        return Err(invalid_field(
            "title",
            "Title cannot be empty or contain only whitespace",
        ));
    }

    Ok(trimmed.to_string())
}

/// Validates a task due date
///
/// A due date in the past is rejected only when creating a task (`is_new`);
/// updates may move the due date anywhere. This asymmetry is part of the
/// documented contract.
///
/// # Errors
///
/// `InvalidField` if `is_new` and the due date is before the current time.
pub fn validate_due_date(
    due_date: Option<DateTime<Utc>>,
    is_new: bool,
) -> Result<(), ValidationError> {
    if let Some(due) = due_date {
        if is_new && due < Utc::now() {
            return Err(invalid_field("due_date", "Due date cannot be in the past"));
        }
    }

    Ok(())
}

/// Validates a username
///
/// Usernames are non-empty and contain only letters, digits, and
/// underscores.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(invalid_field("username", "Username cannot be empty"));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(invalid_field(
            "username",
            "Username can only contain letters, numbers, and underscores",
        ));
    }

    Ok(())
}

/// Validates password length
///
/// # Errors
///
/// `WeakPassword` if shorter than [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword);
    }

    Ok(())
}

/// Registration input, as received from the caller
#[derive(Debug, Clone)]
pub struct Registration {
    /// Requested username
    pub username: String,

    /// Email address (any case; stored lowercased)
    pub email: String,

    /// Plaintext password
    pub password: String,

    /// Plaintext password, repeated
    pub password_confirm: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,
}

/// A registration that passed every rule
///
/// Not yet persisted; the email is lowercased and the password is ready
/// for hashing.
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    /// Validated username
    pub username: String,

    /// Lowercased email
    pub email: String,

    /// Plaintext password, to be hashed before storage
    pub password: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,
}

/// Field-level and cross-field registration rules, in fixed order
///
/// Username charset, then password length, then password confirmation.
/// Pure function; the duplicate-email rule needs the store and lives in
/// [`validate_user_registration`].
pub fn validate_registration_fields(
    reg: Registration,
) -> Result<ValidatedRegistration, ValidationError> {
    validate_username(&reg.username)?;
    validate_password(&reg.password)?;

    if reg.password != reg.password_confirm {
        return Err(ValidationError::PasswordMismatch);
    }

    Ok(ValidatedRegistration {
        username: reg.username,
        email: reg.email.to_lowercase(),
        password: reg.password,
        first_name: reg.first_name,
        last_name: reg.last_name,
    })
}

/// Validates a registration end to end
///
/// Checks, in order: email not already registered (case-insensitive),
/// username charset, password length, password confirmation.
///
/// # Errors
///
/// `DuplicateEmail`, `InvalidField`, `WeakPassword`, or `PasswordMismatch`
/// depending on the first rule that fails.
pub async fn validate_user_registration(
    pool: &PgPool,
    reg: Registration,
) -> Result<ValidatedRegistration, ValidationError> {
    if User::email_taken(pool, &reg.email).await? {
        return Err(ValidationError::DuplicateEmail);
    }

    validate_registration_fields(reg)
}
