/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /v1/auth/register` - Register a new user, returns a bearer token
/// - `POST /v1/auth/login` - Login, returns the user's bearer token
/// - `POST /v1/auth/logout` - Revoke the caller's token
/// - `GET  /v1/auth/profile` - Current user with task statistics

use crate::{
    app::{AppState, CurrentUser},
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhub_shared::{
    auth::{password, service},
    models::user::{CreateUser, User},
    tasks,
    validation::{self, Registration},
};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username
    #[validate(length(min = 1, max = 150, message = "Username must be 1-150 characters"))]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (strength rules applied by the validation engine)
    pub password: String,

    /// Password confirmation
    pub password_confirm: String,

    /// Optional first name
    #[validate(length(max = 150, message = "First name must be at most 150 characters"))]
    pub first_name: Option<String>,

    /// Optional last name
    #[validate(length(max = 150, message = "Last name must be at most 150 characters"))]
    pub last_name: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username
    pub username: String,

    /// Password
    pub password: String,
}

/// User data returned by auth endpoints (never includes the password hash)
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID
    pub id: Uuid,

    /// Username
    pub username: String,

    /// Email address
    pub email: String,

    /// First name, if set
    pub first_name: Option<String>,

    /// Last name, if set
    pub last_name: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Register/login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The user
    pub user: UserResponse,

    /// Bearer token for subsequent requests
    pub token: String,

    /// Human-readable status message
    pub message: String,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    /// Human-readable status message
    pub message: String,
}

/// Per-user task counts
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    /// All tasks owned by the user
    pub total_tasks: i64,

    /// Tasks still pending
    pub pending_tasks: i64,

    /// Tasks completed
    pub completed_tasks: i64,
}

/// Profile response
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// The current user
    pub user: UserResponse,

    /// Task counts
    pub statistics: StatisticsResponse,
}

/// Flattens `validator` errors into the API error payload
pub(crate) fn request_validation_error(e: validator::ValidationErrors) -> ApiError {
    let errors: Vec<ValidationErrorDetail> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| ValidationErrorDetail {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    ApiError::ValidationError(errors)
}

/// Register a new user
///
/// Runs the validation engine (duplicate email, username charset, password
/// length, confirmation), hashes the password, creates the user, and
/// issues a bearer token right away so the client can skip a separate
/// login.
///
/// # Errors
///
/// - `409 Conflict`: email (or username) already registered
/// - `422 Unprocessable Entity`: validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate().map_err(request_validation_error)?;

    let validated = validation::validate_user_registration(
        &state.db,
        Registration {
            username: req.username,
            email: req.email,
            password: req.password,
            password_confirm: req.password_confirm,
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?;

    let password_hash = password::hash_password(&validated.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: validated.username,
            email: validated.email,
            password_hash,
            first_name: validated.first_name,
            last_name: validated.last_name,
        },
    )
    .await?;

    let token = service::issue_token(&state.db, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: UserResponse::from(&user),
            token: token.token,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Login
///
/// Authenticates the username/password pair and returns the user's bearer
/// token, creating one if none exists (repeated logins return the same
/// token).
///
/// # Errors
///
/// - `401 Unauthorized`: unknown username or wrong password
/// - `403 Forbidden`: account disabled
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = service::authenticate(&state.db, &req.username, &req.password).await?;
    let token = service::issue_token(&state.db, user.id).await?;

    Ok(Json(AuthResponse {
        user: UserResponse::from(&user),
        token: token.token,
        message: "Login successful".to_string(),
    }))
}

/// Logout
///
/// Revokes the caller's bearer token. The token used to reach this
/// endpoint stops working immediately.
///
/// # Errors
///
/// - `400 Bad Request`: the caller holds no token
pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<LogoutResponse>> {
    service::revoke_token(&state.db, user.id).await?;

    Ok(Json(LogoutResponse {
        message: "Logout successful".to_string(),
    }))
}

/// Current user's profile with task statistics
pub async fn profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let stats = tasks::statistics(&state.db, user.id).await?;

    Ok(Json(ProfileResponse {
        user: UserResponse::from(&user),
        statistics: StatisticsResponse {
            total_tasks: stats.total_tasks,
            pending_tasks: stats.pending_tasks,
            completed_tasks: stats.completed_tasks,
        },
    }))
}
