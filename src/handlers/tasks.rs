use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::common::{
    created, double_option, double_option_rfc3339, ok, ok_list, validate_optional,
    validate_required, ApiBody,
};
use crate::middlewares::AuthUser;
use crate::models::{NewTask, Task, TaskPatch, TaskStatus};
use crate::services::TaskService;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to "pending"
    pub status: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub deadline: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw status override; bypasses the lifecycle guards
    pub status: Option<String>,
    /// Omit to keep, null to clear, a timestamp to set
    #[serde(default, deserialize_with = "double_option_rfc3339")]
    #[schema(value_type = Option<String>)]
    pub deadline: Option<Option<OffsetDateTime>>,
    /// Omit to keep, null to unassign, an id to reassign
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub user_id: Option<Option<Uuid>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub deadline: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>)]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(rename = "timeSpent")]
    pub time_spent_minutes: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub updated_at: OffsetDateTime,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            deadline: task.deadline,
            user_id: task.user_id,
            started_at: task.started_at,
            completed_at: task.completed_at,
            time_spent_minutes: task.time_spent_minutes,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedTask {
    pub id: Uuid,
    pub message: String,
}

fn parse_status(value: &str) -> AppResult<TaskStatus> {
    match value {
        "pending" => Ok(TaskStatus::Pending),
        "in_progress" => Ok(TaskStatus::InProgress),
        "pending_review" => Ok(TaskStatus::PendingReview),
        "completed" => Ok(TaskStatus::Completed),
        _ => Err(AppError::Validation(
            "Status must be one of 'pending', 'in_progress', 'pending_review', 'completed'"
                .to_string(),
        )),
    }
}

// ============ Handlers ============

/// List tasks: everything for admins, own tasks for everyone else
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Tasks visible to the caller", body = Vec<TaskResponse>),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<Vec<TaskResponse>>>> {
    let (tasks, total) = TaskService::list(state.tasks.as_ref(), &actor).await?;
    let tasks: Vec<TaskResponse> = tasks.into_iter().map(Into::into).collect();
    Ok(ok_list(tasks, total))
}

/// Fetch a single task
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = TaskResponse),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<TaskResponse>>> {
    let task = TaskService::get(state.tasks.as_ref(), id, &actor).await?;
    Ok(ok(task.into()))
}

/// Create a task. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Created task", body = TaskResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn create_task(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<ApiBody<TaskResponse>>)> {
    validate_required(&payload.title, "Title", 1, 255)?;
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    let status = match payload.status.as_deref() {
        Some(value) => parse_status(value)?,
        None => TaskStatus::Pending,
    };

    let input = NewTask {
        title: payload.title,
        description: payload.description,
        status,
        deadline: payload.deadline,
        user_id: payload.user_id,
    };
    let task = TaskService::create(state.tasks.as_ref(), &actor, input).await?;
    Ok(created(task.into()))
}

/// Update task fields. Admin only; a supplied status is written as-is.
#[utoipa::path(
    patch,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Updated task", body = TaskResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
    Json(payload): Json<UpdateTaskRequest>,
) -> AppResult<Json<ApiBody<TaskResponse>>> {
    if let Some(title) = payload.title.as_deref() {
        validate_required(title, "Title", 1, 255)?;
    }
    validate_optional(payload.description.as_deref(), "Description", 2000)?;
    let status = match payload.status.as_deref() {
        Some(value) => Some(parse_status(value)?),
        None => None,
    };

    let patch = TaskPatch {
        title: payload.title,
        description: payload.description,
        status,
        deadline: payload.deadline,
        user_id: payload.user_id,
    };
    let task = TaskService::update(state.tasks.as_ref(), id, &actor, patch).await?;
    Ok(ok(task.into()))
}

/// Delete a task. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Deleted task id", body = DeletedTask),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<DeletedTask>>> {
    let id = TaskService::delete(state.tasks.as_ref(), id, &actor).await?;
    Ok(ok(DeletedTask {
        id,
        message: "Task deleted successfully".to_string(),
    }))
}

/// Begin work: pending -> in_progress
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/start",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task now in progress", body = TaskResponse),
        (status = 400, description = "Task is not pending"),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn start_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<TaskResponse>>> {
    let task = TaskService::start(state.tasks.as_ref(), id, &actor).await?;
    Ok(ok(task.into()))
}

/// Submit work for review: in_progress -> pending_review
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/complete",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task awaiting review", body = TaskResponse),
        (status = 400, description = "Task is not in progress"),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<TaskResponse>>> {
    let task = TaskService::complete(state.tasks.as_ref(), id, &actor).await?;
    Ok(ok(task.into()))
}

/// Accept reviewed work: pending_review -> completed. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/approve",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task completed", body = TaskResponse),
        (status = 400, description = "Task is not pending review"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn approve_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<TaskResponse>>> {
    let task = TaskService::approve(state.tasks.as_ref(), id, &actor).await?;
    Ok(ok(task.into()))
}

/// Send work back: pending_review -> in_progress. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/reject",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task back in progress", body = TaskResponse),
        (status = 400, description = "Task is not pending review"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn reject_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<TaskResponse>>> {
    let task = TaskService::reject(state.tasks.as_ref(), id, &actor).await?;
    Ok(ok(task.into()))
}
