use sea_orm::entity::prelude::StringLen;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Task lifecycle status
///
/// ```text
/// pending --start--> in_progress --complete--> pending_review --approve--> completed
///                         ^                         |
///                         +---------reject----------+
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not yet started
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Being worked by the assignee
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Submitted, waiting for an admin verdict
    #[sea_orm(string_value = "pending_review")]
    PendingReview,
    /// Approved, terminal
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::PendingReview => "pending_review",
            Self::Completed => "completed",
        }
    }
}

/// Lifecycle transitions; each knows the status it may leave from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    Start,
    Complete,
    Approve,
    Reject,
}

impl TaskAction {
    /// Status a task must currently hold for this action to fire
    pub fn required_status(&self) -> TaskStatus {
        match self {
            Self::Start => TaskStatus::Pending,
            Self::Complete => TaskStatus::InProgress,
            Self::Approve | Self::Reject => TaskStatus::PendingReview,
        }
    }

    /// Status the task holds after this action fires
    pub fn target_status(&self) -> TaskStatus {
        match self {
            Self::Start => TaskStatus::InProgress,
            Self::Complete => TaskStatus::PendingReview,
            Self::Approve => TaskStatus::Completed,
            Self::Reject => TaskStatus::InProgress,
        }
    }

    /// Error message when the current status fails the guard
    pub fn guard_message(&self) -> &'static str {
        match self {
            Self::Start => "Only pending tasks can be started",
            Self::Complete => "Only in-progress tasks can be completed",
            Self::Approve => "Only tasks pending review can be approved",
            Self::Reject => "Only tasks pending review can be rejected",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub time_spent_minutes: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Store-level task creation data
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub deadline: Option<OffsetDateTime>,
    pub user_id: Option<Uuid>,
}

/// Partial task update; only supplied fields change.
///
/// `deadline` and `user_id` are tri-state: `None` leaves the column alone,
/// `Some(None)` clears it, `Some(Some(v))` sets it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<Option<OffsetDateTime>>,
    pub user_id: Option<Option<Uuid>>,
}
