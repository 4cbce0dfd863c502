/// Task model and database operations
///
/// Tasks are the core entity of TaskHub. Every task belongs to exactly one
/// user; all queries here are owner-scoped, so a caller can never observe
/// or mutate another user's tasks through this module.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pending', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'pending',
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE INDEX idx_tasks_user_status ON tasks (user_id, status);
/// CREATE INDEX idx_tasks_due_date ON tasks (due_date);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Task status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open
    #[default]
    Pending,

    /// Task is done
    Completed,
}

impl TaskStatus {
    /// Converts status to its database/wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }
}

/// Sortable task columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Status,
}

impl OrderField {
    /// Column name for ORDER BY (whitelist, never interpolate user input)
    fn column(&self) -> &'static str {
        match self {
            OrderField::CreatedAt => "created_at",
            OrderField::UpdatedAt => "updated_at",
            OrderField::DueDate => "due_date",
            OrderField::Status => "status",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(OrderField::CreatedAt),
            "updated_at" => Some(OrderField::UpdatedAt),
            "due_date" => Some(OrderField::DueDate),
            "status" => Some(OrderField::Status),
            _ => None,
        }
    }
}

/// Task list ordering
///
/// Parsed from an `ordering` query parameter in the `-field` style: a
/// leading `-` sorts descending. The default is newest-created first.
///
/// # Example
///
/// ```
/// use taskhub_shared::models::task::{OrderField, TaskOrdering};
///
/// let ordering = TaskOrdering::parse("-due_date").unwrap();
/// assert_eq!(ordering.field, OrderField::DueDate);
/// assert!(ordering.descending);
///
/// // Unknown fields are rejected; callers fall back to the default
/// assert!(TaskOrdering::parse("password_hash").is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskOrdering {
    /// Column to sort by
    pub field: OrderField,

    /// Sort descending instead of ascending
    pub descending: bool,
}

impl Default for TaskOrdering {
    fn default() -> Self {
        Self {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl TaskOrdering {
    /// Parses an ordering expression like `created_at` or `-due_date`
    ///
    /// Returns None for fields outside the sortable whitelist.
    pub fn parse(s: &str) -> Option<Self> {
        let (descending, field) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        OrderField::parse(field).map(|field| Self { field, descending })
    }

    /// ORDER BY clause fragment
    fn sql(&self) -> String {
        format!(
            "{} {}",
            self.field.column(),
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// Filter, search, and ordering options for task listings
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only tasks with this status
    pub status: Option<TaskStatus>,

    /// Only tasks due exactly at this instant
    pub due_date: Option<DateTime<Utc>>,

    /// Case-insensitive substring match over title and description
    pub search: Option<String>,

    /// Sort order (defaults to newest-created first)
    pub ordering: Option<TaskOrdering>,
}

/// Task model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user; immutable after creation
    pub user_id: Uuid,

    /// Title, stored trimmed and never blank
    pub title: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Current status
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,

    /// When the task was created (set once)
    pub created_at: DateTime<Utc>,

    /// When the task was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new task
///
/// The owner is set by the task access layer from the authenticated caller,
/// never from client input.
#[derive(Debug, Clone)]
pub struct CreateTask {
    /// Owning user
    pub user_id: Uuid,

    /// Title (already validated and trimmed)
    pub title: String,

    /// Optional description
    pub description: Option<String>,

    /// Initial status
    pub status: TaskStatus,

    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
}

/// Input for updating a task
///
/// All fields are optional; only present fields are written. The outer
/// `Option` means "was the field supplied", the inner one distinguishes a
/// new value from an explicit clear.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    /// New title (already validated and trimmed)
    pub title: Option<String>,

    /// New description (use Some(None) to clear)
    pub description: Option<Option<String>>,

    /// New status
    pub status: Option<TaskStatus>,

    /// New due date (use Some(None) to clear)
    pub due_date: Option<Option<DateTime<Utc>>>,
}

const TASK_COLUMNS: &str =
    "id, user_id, title, description, status, due_date, created_at, updated_at";

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title, description, status, due_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, description, status, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_date)
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID, scoped to its owner
    ///
    /// Returns None when the task does not exist or belongs to someone else;
    /// callers cannot distinguish the two.
    pub async fn find_by_id_and_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, due_date,
                   created_at, updated_at
            FROM tasks
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists an owner's tasks with optional filter, search, and ordering
    ///
    /// The WHERE clause is built from whichever filter fields are present;
    /// the ORDER BY column comes from the `OrderField` whitelist.
    pub async fn list_by_owner(
        pool: &PgPool,
        user_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut query = format!("SELECT {} FROM tasks WHERE user_id = $1", TASK_COLUMNS);
        let mut bind_count = 1;

        if filter.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND status = ${}", bind_count));
        }
        if filter.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND due_date = ${}", bind_count));
        }
        if filter.search.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND (title ILIKE ${0} OR description ILIKE ${0})",
                bind_count
            ));
        }

        let ordering = filter.ordering.unwrap_or_default();
        query.push_str(&format!(" ORDER BY {}", ordering.sql()));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(user_id);

        if let Some(status) = filter.status {
            q = q.bind(status);
        }
        if let Some(due_date) = filter.due_date {
            q = q.bind(due_date);
        }
        if let Some(ref search) = filter.search {
            q = q.bind(format!("%{}%", search));
        }

        let tasks = q.fetch_all(pool).await?;

        Ok(tasks)
    }

    /// Lists an owner's overdue tasks
    ///
    /// Overdue means still pending with a due date strictly in the past.
    pub async fn list_overdue_by_owner(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, description, status, due_date,
                   created_at, updated_at
            FROM tasks
            WHERE user_id = $1 AND status = 'pending' AND due_date < NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Updates a task, scoped to its owner
    ///
    /// Only supplied fields are written; `updated_at` is always refreshed.
    /// Returns None when no task with that ID belongs to the owner.
    pub async fn update_by_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {}",
            TASK_COLUMNS
        ));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Marks a task completed, scoped to its owner
    ///
    /// Returns None when no task with that ID belongs to the owner.
    pub async fn complete_by_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'completed',
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, description, status, due_date,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task, scoped to its owner
    ///
    /// Returns true if a row was removed.
    pub async fn delete_by_owner(
        pool: &PgPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Counts an owner's tasks
    pub async fn count_by_owner(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    /// Counts an owner's tasks with the given status
    pub async fn count_by_owner_and_status(
        pool: &PgPool,
        user_id: Uuid,
        status: TaskStatus,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = $2")
                .bind(user_id)
                .bind(status)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_status_as_str() {
        assert_eq!(TaskStatus::Pending.as_str(), "pending");
        assert_eq!(TaskStatus::Completed.as_str(), "completed");
    }

    #[test]
    fn test_task_status_default_is_pending() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
    }

    #[test]
    fn test_task_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Completed).unwrap(),
            "\"completed\""
        );
        let status: TaskStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(status, TaskStatus::Pending);
    }

    #[test]
    fn test_ordering_parse_ascending() {
        let ordering = TaskOrdering::parse("due_date").unwrap();
        assert_eq!(ordering.field, OrderField::DueDate);
        assert!(!ordering.descending);
    }

    #[test]
    fn test_ordering_parse_descending() {
        let ordering = TaskOrdering::parse("-updated_at").unwrap();
        assert_eq!(ordering.field, OrderField::UpdatedAt);
        assert!(ordering.descending);
    }

    #[test]
    fn test_ordering_parse_rejects_unknown_fields() {
        assert!(TaskOrdering::parse("user_id").is_none());
        assert!(TaskOrdering::parse("-password_hash").is_none());
        assert!(TaskOrdering::parse("").is_none());
        assert!(TaskOrdering::parse("-").is_none());
    }

    #[test]
    fn test_ordering_default_is_newest_first() {
        let ordering = TaskOrdering::default();
        assert_eq!(ordering.field, OrderField::CreatedAt);
        assert!(ordering.descending);
        assert_eq!(ordering.sql(), "created_at DESC");
    }

    #[test]
    fn test_update_task_default_touches_nothing() {
        let update = UpdateTask::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.status.is_none());
        assert!(update.due_date.is_none());
    }
}
