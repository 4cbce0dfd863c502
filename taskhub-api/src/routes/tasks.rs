/// Task endpoints
///
/// All handlers run behind the bearer-token layer and operate on the
/// authenticated caller's tasks only.
///
/// # Endpoints
///
/// - `GET    /v1/tasks` - List with filter/search/ordering query params
/// - `POST   /v1/tasks` - Create
/// - `GET    /v1/tasks/pending` - Pending tasks
/// - `GET    /v1/tasks/completed` - Completed tasks
/// - `GET    /v1/tasks/overdue` - Pending tasks past their due date
/// - `GET    /v1/tasks/:id` - Fetch one
/// - `PATCH  /v1/tasks/:id` - Partial update
/// - `DELETE /v1/tasks/:id` - Delete
/// - `POST   /v1/tasks/:id/complete` - Mark completed

use crate::{
    app::{AppState, CurrentUser},
    error::ApiResult,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use taskhub_shared::{
    models::task::{Task, TaskFilter, TaskOrdering, TaskStatus, UpdateTask},
    tasks::{self, NewTask},
};
use uuid::Uuid;
use validator::Validate;

/// Query parameters for task listings
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Filter by status (`pending` or `completed`)
    pub status: Option<TaskStatus>,

    /// Filter by exact due date (RFC 3339)
    pub due_date: Option<DateTime<Utc>>,

    /// Case-insensitive substring search over title and description
    pub search: Option<String>,

    /// Sort expression, e.g. `due_date` or `-updated_at`
    pub ordering: Option<String>,
}

impl ListTasksQuery {
    fn into_filter(self) -> TaskFilter {
        TaskFilter {
            status: self.status,
            due_date: self.due_date,
            search: self.search,
            // Unknown ordering fields fall back to the default rather than
            // erroring
            ordering: self.ordering.as_deref().and_then(TaskOrdering::parse),
        }
    }
}

/// Create task request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    /// Task title
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status; defaults to `pending`
    pub status: Option<TaskStatus>,

    /// Optional due date; must not be in the past
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update request
///
/// Omitted fields are untouched; an explicit `null` clears the stored
/// value of `description`/`due_date`. The owner cannot be changed.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// New title
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,

    /// New description; `null` clears it
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New due date; `null` clears it
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Distinguishes an absent field (outer None) from an explicit `null`
/// (Some(None)); plain `Option<Option<T>>` collapses both to None.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Task data returned by all task endpoints
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    /// Task ID
    pub id: Uuid,

    /// Owner's username
    pub username: String,

    /// Title
    pub title: String,

    /// Description, if set
    pub description: Option<String>,

    /// Status
    pub status: TaskStatus,

    /// Due date, if set
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

impl TaskResponse {
    fn new(task: Task, username: &str) -> Self {
        Self {
            id: task.id,
            username: username.to_string(),
            title: task.title,
            description: task.description,
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

fn to_responses(tasks: Vec<Task>, username: &str) -> Vec<TaskResponse> {
    tasks
        .into_iter()
        .map(|t| TaskResponse::new(t, username))
        .collect()
}

/// List the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let filter = query.into_filter();
    let tasks = tasks::list_tasks(&state.db, user.id, &filter).await?;

    Ok(Json(to_responses(tasks, &user.username)))
}

/// List the caller's pending tasks
pub async fn list_pending(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = tasks::list_pending(&state.db, user.id).await?;
    Ok(Json(to_responses(tasks, &user.username)))
}

/// List the caller's completed tasks
pub async fn list_completed(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = tasks::list_completed(&state.db, user.id).await?;
    Ok(Json(to_responses(tasks, &user.username)))
}

/// List the caller's overdue tasks
pub async fn list_overdue(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = tasks::list_overdue(&state.db, user.id).await?;
    Ok(Json(to_responses(tasks, &user.username)))
}

/// Create a task owned by the caller
///
/// # Errors
///
/// - `422 Unprocessable Entity`: blank title or past due date
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()
        .map_err(super::auth::request_validation_error)?;

    let task = tasks::create_task(
        &state.db,
        user.id,
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse::new(task, &user.username)),
    ))
}

/// Fetch one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: no such task owned by the caller
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::get_task(&state.db, user.id, id).await?;
    Ok(Json(TaskResponse::new(task, &user.username)))
}

/// Partially update one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: no such task owned by the caller
/// - `422 Unprocessable Entity`: blank title
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()
        .map_err(super::auth::request_validation_error)?;

    let task = tasks::update_task(
        &state.db,
        user.id,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            status: req.status,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok(Json(TaskResponse::new(task, &user.username)))
}

/// Mark one of the caller's tasks completed
///
/// # Errors
///
/// - `404 Not Found`: no such task owned by the caller
pub async fn complete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = tasks::complete_task(&state.db, user.id, id).await?;
    Ok(Json(TaskResponse::new(task, &user.username)))
}

/// Delete one of the caller's tasks
///
/// # Errors
///
/// - `404 Not Found`: no such task owned by the caller
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tasks::delete_task(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        assert!(req.due_date.is_none());

        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": "notes"}"#).unwrap();
        assert_eq!(req.description, Some(Some("notes".to_string())));

        let req: UpdateTaskRequest = serde_json::from_str("{}").unwrap();
        assert!(req.description.is_none());
    }

    #[test]
    fn test_list_query_into_filter_parses_ordering() {
        let query = ListTasksQuery {
            ordering: Some("-due_date".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter();
        assert!(filter.ordering.is_some());
        assert!(filter.ordering.unwrap().descending);
    }

    #[test]
    fn test_list_query_ignores_unknown_ordering() {
        let query = ListTasksQuery {
            ordering: Some("password_hash".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter();
        assert!(filter.ordering.is_none());
    }

    #[test]
    fn test_status_param_parses_lowercase() {
        let status: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, TaskStatus::Completed);
        assert!(serde_json::from_str::<TaskStatus>("\"done\"").is_err());
    }
}
