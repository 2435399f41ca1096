use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{NewTask, Task, TaskAction, TaskPatch};
use crate::store::TaskStore;

const NO_ACCESS: &str = "You do not have access to this task";
const NOT_ASSIGNEE: &str = "You can only work on tasks assigned to you";

/// Whole minutes between two instants, rounded half away from zero
pub(crate) fn minutes_between(start: OffsetDateTime, end: OffsetDateTime) -> i32 {
    let seconds = (end - start).as_seconds_f64();
    (seconds / 60.0).round() as i32
}

/// Task CRUD and the lifecycle state machine.
///
/// Guards run in a fixed order for every id-bearing action: the task must
/// exist, then the actor must be authorized, then the status must match the
/// transition. A failed guard never mutates anything; the writes themselves
/// are compare-and-swap at the store, so racing transitions produce exactly
/// one winner.
pub struct TaskService;

impl TaskService {
    /// Admins see every task; everyone else sees only their own
    pub async fn list(tasks: &dyn TaskStore, actor: &AuthUser) -> AppResult<(Vec<Task>, u64)> {
        if actor.role.is_admin() {
            let all = tasks.all().await?;
            let total = tasks.count().await?;
            Ok((all, total))
        } else {
            let own = tasks.for_owner(actor.id).await?;
            let total = own.len() as u64;
            Ok((own, total))
        }
    }

    pub async fn get(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Task> {
        let task = tasks
            .find_by_id(id)
            .await?
            .ok_or(AppError::TaskNotFound(id))?;

        // Existence is not hidden from authenticated users
        if !actor.role.is_admin() && !task.is_assigned_to(actor.id) {
            return Err(AppError::Forbidden(NO_ACCESS));
        }
        Ok(task)
    }

    pub async fn create(
        tasks: &dyn TaskStore,
        actor: &AuthUser,
        input: NewTask,
    ) -> AppResult<Task> {
        if !actor.role.is_admin() {
            return Err(AppError::admin_required());
        }

        let task = tasks.create(input).await?;
        tracing::info!(task_id = %task.id, "task created");
        Ok(task)
    }

    pub async fn update(
        tasks: &dyn TaskStore,
        id: Uuid,
        actor: &AuthUser,
        patch: TaskPatch,
    ) -> AppResult<Task> {
        Self::find_for_admin(tasks, id, actor).await?;

        tasks
            .update(id, patch)
            .await?
            .ok_or(AppError::TaskNotFound(id))
    }

    pub async fn delete(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Uuid> {
        Self::find_for_admin(tasks, id, actor).await?;

        if !tasks.delete(id).await? {
            return Err(AppError::TaskNotFound(id));
        }
        tracing::info!(task_id = %id, "task deleted");
        Ok(id)
    }

    /// pending -> in_progress, stamping started_at
    pub async fn start(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Task> {
        Self::check_transition(tasks, id, actor, TaskAction::Start).await?;

        match tasks.start(id, OffsetDateTime::now_utc()).await? {
            Some(task) => {
                tracing::info!(task_id = %id, user_id = %actor.id, "task started");
                Ok(task)
            }
            None => Err(Self::guard_lost(tasks, id, TaskAction::Start).await),
        }
    }

    /// in_progress -> pending_review, deriving the minutes worked
    pub async fn complete(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Task> {
        let task = Self::check_transition(tasks, id, actor, TaskAction::Complete).await?;

        // Reachable only through a raw status override; refusing beats
        // fabricating a work span out of nothing.
        let Some(started_at) = task.started_at else {
            return Err(AppError::Internal(format!(
                "task {} is in progress without a start time",
                id
            )));
        };

        let now = OffsetDateTime::now_utc();
        let minutes = minutes_between(started_at, now);
        match tasks.complete(id, now, minutes).await? {
            Some(task) => {
                tracing::info!(task_id = %id, minutes, "task completed");
                Ok(task)
            }
            None => Err(Self::guard_lost(tasks, id, TaskAction::Complete).await),
        }
    }

    /// pending_review -> completed
    pub async fn approve(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Task> {
        Self::check_transition(tasks, id, actor, TaskAction::Approve).await?;

        match tasks.approve(id).await? {
            Some(task) => {
                tracing::info!(task_id = %id, "task approved");
                Ok(task)
            }
            None => Err(Self::guard_lost(tasks, id, TaskAction::Approve).await),
        }
    }

    /// pending_review -> in_progress; completion data clears, started_at stays
    pub async fn reject(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Task> {
        Self::check_transition(tasks, id, actor, TaskAction::Reject).await?;

        match tasks.reject(id).await? {
            Some(task) => {
                tracing::info!(task_id = %id, "task rejected");
                Ok(task)
            }
            None => Err(Self::guard_lost(tasks, id, TaskAction::Reject).await),
        }
    }

    /// Existence then admin-ness, in that order
    async fn find_for_admin(tasks: &dyn TaskStore, id: Uuid, actor: &AuthUser) -> AppResult<Task> {
        let task = tasks
            .find_by_id(id)
            .await?
            .ok_or(AppError::TaskNotFound(id))?;
        if !actor.role.is_admin() {
            return Err(AppError::admin_required());
        }
        Ok(task)
    }

    /// Existence, then authorization for the action, then the status guard
    async fn check_transition(
        tasks: &dyn TaskStore,
        id: Uuid,
        actor: &AuthUser,
        action: TaskAction,
    ) -> AppResult<Task> {
        let task = tasks
            .find_by_id(id)
            .await?
            .ok_or(AppError::TaskNotFound(id))?;

        let allowed = match action {
            TaskAction::Start | TaskAction::Complete => {
                actor.role.is_admin() || task.is_assigned_to(actor.id)
            }
            TaskAction::Approve | TaskAction::Reject => actor.role.is_admin(),
        };
        if !allowed {
            return Err(match action {
                TaskAction::Start | TaskAction::Complete => AppError::Forbidden(NOT_ASSIGNEE),
                TaskAction::Approve | TaskAction::Reject => AppError::admin_required(),
            });
        }

        if task.status != action.required_status() {
            return Err(AppError::InvalidTransition(action));
        }
        Ok(task)
    }

    /// The swap found a different status than the pre-check did. Re-read to
    /// tell a lost race from a concurrent delete.
    async fn guard_lost(tasks: &dyn TaskStore, id: Uuid, action: TaskAction) -> AppError {
        match tasks.find_by_id(id).await {
            Ok(Some(_)) => AppError::InvalidTransition(action),
            Ok(None) => AppError::TaskNotFound(id),
            Err(e) => e,
        }
    }
}
