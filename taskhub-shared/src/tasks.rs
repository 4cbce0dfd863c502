/// Task access layer
///
/// Owner-scoped task operations. Every function takes the caller's user ID
/// explicitly and passes it into the SQL predicate, so a task belonging to
/// another user behaves exactly like a missing one (`NotFound`). Input runs
/// through the validation engine before anything is persisted.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::tasks::{self, NewTask};
///
/// # async fn example(pool: sqlx::PgPool, caller: uuid::Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let task = tasks::create_task(&pool, caller, NewTask {
///     title: "Buy milk".to_string(),
///     description: None,
///     status: None,
///     due_date: None,
/// }).await?;
///
/// let completed = tasks::complete_task(&pool, caller, task.id).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::validation::{self, ValidationError};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskAccessError {
    /// No task with that ID owned by the caller
    #[error("Task not found")]
    NotFound,

    /// Input failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Database failure
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Input for creating a task
///
/// Carries no owner field: the owner is always the caller.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Task title (validated and trimmed before storage)
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status; defaults to pending when omitted
    pub status: Option<TaskStatus>,

    /// Optional due date; must not be in the past
    pub due_date: Option<DateTime<Utc>>,
}

/// Per-user task counts, for the profile view
#[derive(Debug, Clone, Copy)]
pub struct TaskStatistics {
    /// All tasks owned by the user
    pub total_tasks: i64,

    /// Tasks still pending
    pub pending_tasks: i64,

    /// Tasks completed
    pub completed_tasks: i64,
}

/// Creates a task owned by the caller
///
/// The title is trimmed; the due date, if given, must not be earlier than
/// now. `created_at`/`updated_at` are set by the store.
///
/// # Errors
///
/// `Validation` for a blank title or past due date.
pub async fn create_task(
    pool: &PgPool,
    caller: Uuid,
    input: NewTask,
) -> Result<Task, TaskAccessError> {
    let title = validation::validate_task_title(&input.title)?;
    validation::validate_due_date(input.due_date, true)?;

    let task = Task::create(
        pool,
        CreateTask {
            user_id: caller,
            title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            due_date: input.due_date,
        },
    )
    .await?;

    Ok(task)
}

/// Fetches one of the caller's tasks by ID
///
/// # Errors
///
/// `NotFound` if the task does not exist or belongs to someone else.
pub async fn get_task(pool: &PgPool, caller: Uuid, id: Uuid) -> Result<Task, TaskAccessError> {
    Task::find_by_id_and_owner(pool, id, caller)
        .await?
        .ok_or(TaskAccessError::NotFound)
}

/// Lists the caller's tasks
///
/// Supports status and due-date equality filters, free-text search over
/// title and description, and ordering by created_at/updated_at/due_date/
/// status. Defaults to newest-created first.
pub async fn list_tasks(
    pool: &PgPool,
    caller: Uuid,
    filter: &TaskFilter,
) -> Result<Vec<Task>, TaskAccessError> {
    let tasks = Task::list_by_owner(pool, caller, filter).await?;
    Ok(tasks)
}

/// Lists the caller's pending tasks
pub async fn list_pending(pool: &PgPool, caller: Uuid) -> Result<Vec<Task>, TaskAccessError> {
    let filter = TaskFilter {
        status: Some(TaskStatus::Pending),
        ..Default::default()
    };
    list_tasks(pool, caller, &filter).await
}

/// Lists the caller's completed tasks
pub async fn list_completed(pool: &PgPool, caller: Uuid) -> Result<Vec<Task>, TaskAccessError> {
    let filter = TaskFilter {
        status: Some(TaskStatus::Completed),
        ..Default::default()
    };
    list_tasks(pool, caller, &filter).await
}

/// Lists the caller's overdue tasks
///
/// Overdue: status pending and due date strictly before now. Completed
/// tasks are never overdue, however far past their due date.
pub async fn list_overdue(pool: &PgPool, caller: Uuid) -> Result<Vec<Task>, TaskAccessError> {
    let tasks = Task::list_overdue_by_owner(pool, caller).await?;
    Ok(tasks)
}

/// Updates one of the caller's tasks
///
/// Only supplied fields change; the owner is immutable. A supplied title is
/// validated and trimmed. The past-due-date rule does not apply to updates.
///
/// # Errors
///
/// `NotFound` if the task does not exist or belongs to someone else;
/// `Validation` for a blank title.
pub async fn update_task(
    pool: &PgPool,
    caller: Uuid,
    id: Uuid,
    mut changes: UpdateTask,
) -> Result<Task, TaskAccessError> {
    if let Some(ref title) = changes.title {
        changes.title = Some(validation::validate_task_title(title)?);
    }
    // is_new = false: past due dates are acceptable on edit
    validation::validate_due_date(changes.due_date.flatten(), false)?;

    Task::update_by_owner(pool, id, caller, changes)
        .await?
        .ok_or(TaskAccessError::NotFound)
}

/// Marks one of the caller's tasks completed
///
/// # Errors
///
/// `NotFound` if the task does not exist or belongs to someone else.
pub async fn complete_task(pool: &PgPool, caller: Uuid, id: Uuid) -> Result<Task, TaskAccessError> {
    Task::complete_by_owner(pool, id, caller)
        .await?
        .ok_or(TaskAccessError::NotFound)
}

/// Permanently deletes one of the caller's tasks
///
/// # Errors
///
/// `NotFound` if the task does not exist or belongs to someone else.
pub async fn delete_task(pool: &PgPool, caller: Uuid, id: Uuid) -> Result<(), TaskAccessError> {
    let deleted = Task::delete_by_owner(pool, id, caller).await?;

    if deleted {
        Ok(())
    } else {
        Err(TaskAccessError::NotFound)
    }
}

/// Computes the caller's task counts
pub async fn statistics(pool: &PgPool, caller: Uuid) -> Result<TaskStatistics, TaskAccessError> {
    let total_tasks = Task::count_by_owner(pool, caller).await?;
    let pending_tasks = Task::count_by_owner_and_status(pool, caller, TaskStatus::Pending).await?;
    let completed_tasks =
        Task::count_by_owner_and_status(pool, caller, TaskStatus::Completed).await?;

    Ok(TaskStatistics {
        total_tasks,
        pending_tasks,
        completed_tasks,
    })
}
