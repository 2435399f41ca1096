use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewTask, NewUser, Role, Task, TaskPatch, TaskStatus, User, UserPatch};
use crate::store::{TaskStore, UserDelete, UserStore, UserUpdate};

/// In-memory store for tests and local development.
///
/// Users and tasks live under one mutex, which gives the cross-record
/// guarantees (admin counting, unassign-on-delete) the SQL backend gets
/// from transactions.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    tasks: HashMap<Uuid, Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MemoryStoreInner {
                users: HashMap::new(),
                tasks: HashMap::new(),
            })),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    fn admin_count(&self) -> u64 {
        self.users.values().filter(|u| u.role.is_admin()).count() as u64
    }

    fn email_taken(&self, email: &str, excluding: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != excluding)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.lock().await;
        if inner.email_taken(&user.email, None) {
            return Err(AppError::EmailExists);
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn all(&self) -> AppResult<Vec<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn count_admins(&self) -> AppResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.admin_count())
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> AppResult<UserUpdate> {
        let mut inner = self.inner.lock().await;

        let Some(current) = inner.users.get(&id) else {
            return Ok(UserUpdate::Missing);
        };
        let demotes = current.role.is_admin() && patch.role == Some(Role::User);

        if let Some(email) = &patch.email {
            if inner.email_taken(email, Some(id)) {
                return Ok(UserUpdate::EmailTaken);
            }
        }
        if demotes && inner.admin_count() <= 1 {
            return Ok(UserUpdate::LastAdmin);
        }

        match inner.users.get_mut(&id) {
            Some(user) => {
                if let Some(name) = patch.name {
                    user.name = name;
                }
                if let Some(email) = patch.email {
                    user.email = email;
                }
                if let Some(role) = patch.role {
                    user.role = role;
                }
                user.updated_at = OffsetDateTime::now_utc();
                Ok(UserUpdate::Applied(user.clone()))
            }
            None => Ok(UserUpdate::Missing),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<UserDelete> {
        let mut inner = self.inner.lock().await;

        let Some(target) = inner.users.get(&id) else {
            return Ok(UserDelete::Missing);
        };
        if target.role.is_admin() && inner.admin_count() <= 1 {
            return Ok(UserDelete::LastAdmin);
        }

        inner.users.remove(&id);
        // Mirror of the FK's ON DELETE SET NULL
        for task in inner.tasks.values_mut() {
            if task.user_id == Some(id) {
                task.user_id = None;
            }
        }
        Ok(UserDelete::Deleted)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, task: NewTask) -> AppResult<Task> {
        let mut inner = self.inner.lock().await;
        let now = OffsetDateTime::now_utc();
        let task = Task {
            id: Uuid::new_v4(),
            title: task.title,
            description: task.description,
            status: task.status,
            deadline: task.deadline,
            user_id: task.user_id,
            started_at: None,
            completed_at: None,
            time_spent_minutes: None,
            created_at: now,
            updated_at: now,
        };
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let inner = self.inner.lock().await;
        Ok(inner.tasks.get(&id).cloned())
    }

    async fn all(&self) -> AppResult<Vec<Task>> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<Task> = inner.tasks.values().cloned().collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn for_owner(&self, user_id: Uuid) -> AppResult<Vec<Task>> {
        let inner = self.inner.lock().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|t| t.user_id == Some(user_id))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn count(&self) -> AppResult<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.tasks.len() as u64)
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            // Raw override: lifecycle timestamps are deliberately untouched
            task.status = status;
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = deadline;
        }
        if let Some(user_id) = patch.user_id {
            task.user_id = user_id;
        }
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut inner = self.inner.lock().await;
        Ok(inner.tasks.remove(&id).is_some())
    }

    async fn start(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<Task>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if task.status != TaskStatus::Pending {
            return Ok(None);
        }

        task.status = TaskStatus::InProgress;
        task.started_at = Some(at);
        task.updated_at = at;
        Ok(Some(task.clone()))
    }

    async fn complete(
        &self,
        id: Uuid,
        at: OffsetDateTime,
        minutes: i32,
    ) -> AppResult<Option<Task>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if task.status != TaskStatus::InProgress {
            return Ok(None);
        }

        task.status = TaskStatus::PendingReview;
        task.completed_at = Some(at);
        task.time_spent_minutes = Some(minutes);
        task.updated_at = at;
        Ok(Some(task.clone()))
    }

    async fn approve(&self, id: Uuid) -> AppResult<Option<Task>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if task.status != TaskStatus::PendingReview {
            return Ok(None);
        }

        task.status = TaskStatus::Completed;
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }

    async fn reject(&self, id: Uuid) -> AppResult<Option<Task>> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.get_mut(&id) else {
            return Ok(None);
        };
        if task.status != TaskStatus::PendingReview {
            return Ok(None);
        }

        task.status = TaskStatus::InProgress;
        task.completed_at = None;
        task.time_spent_minutes = None;
        task.updated_at = OffsetDateTime::now_utc();
        Ok(Some(task.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    fn new_task(title: &str, user_id: Option<Uuid>) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            deadline: None,
            user_id,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("A", "a@x.co", Role::User))
            .await
            .unwrap();

        let result = UserStore::create(&store, new_user("B", "a@x.co", Role::User)).await;
        assert!(matches!(result, Err(AppError::EmailExists)));
    }

    #[tokio::test]
    async fn test_last_admin_demote_guard() {
        let store = MemoryStore::new();
        let admin = UserStore::create(&store, new_user("Root", "root@x.co", Role::Admin))
            .await
            .unwrap();

        let patch = UserPatch {
            role: Some(Role::User),
            ..Default::default()
        };
        let outcome = UserStore::update(&store, admin.id, patch.clone())
            .await
            .unwrap();
        assert!(matches!(outcome, UserUpdate::LastAdmin));

        // A second admin unblocks the demotion
        UserStore::create(&store, new_user("Other", "other@x.co", Role::Admin))
            .await
            .unwrap();
        let outcome = UserStore::update(&store, admin.id, patch).await.unwrap();
        assert!(matches!(outcome, UserUpdate::Applied(_)));
        assert_eq!(store.count_admins().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_last_admin_delete_guard() {
        let store = MemoryStore::new();
        let admin = UserStore::create(&store, new_user("Root", "root@x.co", Role::Admin))
            .await
            .unwrap();

        let outcome = UserStore::delete(&store, admin.id).await.unwrap();
        assert_eq!(outcome, UserDelete::LastAdmin);

        let user = UserStore::create(&store, new_user("U", "u@x.co", Role::User))
            .await
            .unwrap();
        let outcome = UserStore::delete(&store, user.id).await.unwrap();
        assert_eq!(outcome, UserDelete::Deleted);
    }

    #[tokio::test]
    async fn test_delete_user_unassigns_tasks() {
        let store = MemoryStore::new();
        UserStore::create(&store, new_user("Root", "root@x.co", Role::Admin))
            .await
            .unwrap();
        let user = UserStore::create(&store, new_user("U", "u@x.co", Role::User))
            .await
            .unwrap();
        let task = TaskStore::create(&store, new_task("t", Some(user.id)))
            .await
            .unwrap();

        UserStore::delete(&store, user.id).await.unwrap();

        let task = TaskStore::find_by_id(&store, task.id).await.unwrap().unwrap();
        assert_eq!(task.user_id, None);
    }

    #[tokio::test]
    async fn test_start_is_compare_and_swap() {
        let store = MemoryStore::new();
        let task = TaskStore::create(&store, new_task("t", None)).await.unwrap();
        let at = OffsetDateTime::now_utc();

        let started = store.start(task.id, at).await.unwrap().unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);
        assert_eq!(started.started_at, Some(at));

        // Already in progress: the swap fails without touching the task
        assert!(store.start(task.id, at).await.unwrap().is_none());
        let task = TaskStore::find_by_id(&store, task.id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn test_reject_preserves_started_at() {
        let store = MemoryStore::new();
        let task = TaskStore::create(&store, new_task("t", None)).await.unwrap();
        let started_at = OffsetDateTime::now_utc();

        store.start(task.id, started_at).await.unwrap();
        store
            .complete(task.id, OffsetDateTime::now_utc(), 2)
            .await
            .unwrap();

        let rejected = store.reject(task.id).await.unwrap().unwrap();
        assert_eq!(rejected.status, TaskStatus::InProgress);
        assert_eq!(rejected.started_at, Some(started_at));
        assert_eq!(rejected.completed_at, None);
        assert_eq!(rejected.time_spent_minutes, None);
    }

    #[tokio::test]
    async fn test_lifecycle_guards_wrong_status() {
        let store = MemoryStore::new();
        let task = TaskStore::create(&store, new_task("t", None)).await.unwrap();
        let now = OffsetDateTime::now_utc();

        // Pending task: only start may fire
        assert!(store.complete(task.id, now, 0).await.unwrap().is_none());
        assert!(store.approve(task.id).await.unwrap().is_none());
        assert!(store.reject(task.id).await.unwrap().is_none());

        store.start(task.id, now).await.unwrap();
        assert!(store.approve(task.id).await.unwrap().is_none());

        store.complete(task.id, now, 0).await.unwrap();
        let approved = store.approve(task.id).await.unwrap().unwrap();
        assert_eq!(approved.status, TaskStatus::Completed);

        // Terminal: nothing fires
        assert!(store.approve(task.id).await.unwrap().is_none());
        assert!(store.reject(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_raw_status_override_keeps_timestamps() {
        let store = MemoryStore::new();
        let task = TaskStore::create(&store, new_task("t", None)).await.unwrap();

        let patch = TaskPatch {
            status: Some(TaskStatus::InProgress),
            ..Default::default()
        };
        let updated = TaskStore::update(&store, task.id, patch)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.started_at, None);
    }
}
