pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{NewTask, NewUser, Task, TaskPatch, User, UserPatch};

/// Outcome of a guarded user update
#[derive(Debug)]
pub enum UserUpdate {
    Applied(User),
    Missing,
    /// Patch email collides with another account
    EmailTaken,
    /// Patch would demote the only remaining admin
    LastAdmin,
}

/// Outcome of a guarded user delete
#[derive(Debug, PartialEq, Eq)]
pub enum UserDelete {
    Deleted,
    Missing,
    /// Target is the only remaining admin
    LastAdmin,
}

/// User persistence, abstracted so handlers and services never see a backend
/// Follows the async_trait object pattern used across the codebase
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user; fails with `EmailExists` on a taken address
    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// All users, name ascending
    async fn all(&self) -> AppResult<Vec<User>>;

    async fn count_admins(&self) -> AppResult<u64>;

    /// Apply a partial update. The last-admin demotion guard runs atomically
    /// with the write, so two racing demotions cannot empty the admin pool.
    async fn update(&self, id: Uuid, patch: UserPatch) -> AppResult<UserUpdate>;

    /// Delete a user, unassigning (not deleting) their tasks. The last-admin
    /// guard runs atomically with the delete.
    async fn delete(&self, id: Uuid) -> AppResult<UserDelete>;
}

/// Task persistence plus the four lifecycle transitions as compare-and-swap
/// writes: each fires only if the task still holds the transition's source
/// status and returns `None` to the loser of a race.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: NewTask) -> AppResult<Task>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>>;

    /// All tasks, newest first
    async fn all(&self) -> AppResult<Vec<Task>>;

    /// Tasks assigned to one user, newest first
    async fn for_owner(&self, user_id: Uuid) -> AppResult<Vec<Task>>;

    async fn count(&self) -> AppResult<u64>;

    /// Generic field update; `None` when the task does not exist
    async fn update(&self, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>>;

    /// Returns false when the task does not exist
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// pending -> in_progress, recording when work began
    async fn start(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<Task>>;

    /// in_progress -> pending_review, recording completion time and the
    /// derived minutes of work
    async fn complete(&self, id: Uuid, at: OffsetDateTime, minutes: i32)
        -> AppResult<Option<Task>>;

    /// pending_review -> completed
    async fn approve(&self, id: Uuid) -> AppResult<Option<Task>>;

    /// pending_review -> in_progress, clearing completion data but keeping
    /// started_at so a re-completion bills the full span
    async fn reject(&self, id: Uuid) -> AppResult<Option<Task>>;
}
