use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entity::task::{self, Entity as TaskEntity};
use crate::entity::user::{self, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{NewTask, NewUser, Role, Task, TaskPatch, TaskStatus, User, UserPatch};
use crate::store::{TaskStore, UserDelete, UserStore, UserUpdate};

/// Postgres store over a SeaORM connection
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lock every admin row in a stable order. Competing demotions and
    /// deletes all take the same lock sequence, so they serialize instead
    /// of deadlocking, and the count they see cannot change under them.
    async fn lock_admins<C>(conn: &C) -> Result<Vec<user::Model>, DbErr>
    where
        C: sea_orm::ConnectionTrait,
    {
        UserEntity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .order_by_asc(user::Column::Id)
            .lock_exclusive()
            .all(conn)
            .await
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, input: NewUser) -> AppResult<User> {
        let now = OffsetDateTime::now_utc();
        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            name: Set(input.name),
            role: Set(input.role),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(&self.db).await.map_err(|e| {
            if e.to_string().contains("duplicate key") || e.to_string().contains("unique") {
                AppError::EmailExists
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let model = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let model = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;
        Ok(model.map(User::from))
    }

    async fn all(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn count_admins(&self) -> AppResult<u64> {
        let count = UserEntity::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, patch: UserPatch) -> AppResult<UserUpdate> {
        let txn = self.db.begin().await?;

        if patch.role == Some(Role::User) {
            let admins = Self::lock_admins(&txn).await?;
            let target_is_admin = admins.iter().any(|a| a.id == id);
            if target_is_admin && admins.len() <= 1 {
                txn.rollback().await?;
                return Ok(UserUpdate::LastAdmin);
            }
        }

        let Some(model) = UserEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            txn.rollback().await?;
            return Ok(UserUpdate::Missing);
        };

        let mut active: user::ActiveModel = model.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(email) = patch.email {
            active.email = Set(email);
        }
        if let Some(role) = patch.role {
            active.role = Set(role);
        }
        active.updated_at = Set(OffsetDateTime::now_utc());

        match active.update(&txn).await {
            Ok(updated) => {
                txn.commit().await?;
                Ok(UserUpdate::Applied(updated.into()))
            }
            Err(e) => {
                txn.rollback().await?;
                let msg = e.to_string();
                if msg.contains("duplicate key") || msg.contains("unique") {
                    Ok(UserUpdate::EmailTaken)
                } else {
                    Err(AppError::Database(msg))
                }
            }
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<UserDelete> {
        let txn = self.db.begin().await?;

        let admins = Self::lock_admins(&txn).await?;
        let target_is_admin = admins.iter().any(|a| a.id == id);
        if target_is_admin && admins.len() <= 1 {
            txn.rollback().await?;
            return Ok(UserDelete::LastAdmin);
        }

        // The tasks FK is ON DELETE SET NULL, so assignments clear here
        let result = UserEntity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(UserDelete::Missing);
        }

        txn.commit().await?;
        Ok(UserDelete::Deleted)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create(&self, input: NewTask) -> AppResult<Task> {
        let now = OffsetDateTime::now_utc();
        let model = task::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            status: Set(input.status),
            deadline: Set(input.deadline),
            user_id: Set(input.user_id),
            started_at: Set(None),
            completed_at: Set(None),
            time_spent_minutes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(&self.db).await?;
        Ok(result.into())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Task>> {
        let model = TaskEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Task::from))
    }

    async fn all(&self) -> AppResult<Vec<Task>> {
        let models = TaskEntity::find()
            .order_by_desc(task::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Task::from).collect())
    }

    async fn for_owner(&self, user_id: Uuid) -> AppResult<Vec<Task>> {
        let models = TaskEntity::find()
            .filter(task::Column::UserId.eq(user_id))
            .order_by_desc(task::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Task::from).collect())
    }

    async fn count(&self) -> AppResult<u64> {
        let count = TaskEntity::find().count(&self.db).await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> AppResult<Option<Task>> {
        let Some(model) = TaskEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: task::ActiveModel = model.into();
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(Some(description));
        }
        if let Some(status) = patch.status {
            // Raw override: lifecycle timestamps are deliberately untouched
            active.status = Set(status);
        }
        if let Some(deadline) = patch.deadline {
            active.deadline = Set(deadline);
        }
        if let Some(user_id) = patch.user_id {
            active.user_id = Set(user_id);
        }
        active.updated_at = Set(OffsetDateTime::now_utc());

        match active.update(&self.db).await {
            Ok(updated) => Ok(Some(updated.into())),
            // Row deleted between the find and the write
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = TaskEntity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn start(&self, id: Uuid, at: OffsetDateTime) -> AppResult<Option<Task>> {
        let updated = TaskEntity::update_many()
            .col_expr(task::Column::Status, Expr::value(TaskStatus::InProgress))
            .col_expr(task::Column::StartedAt, Expr::value(Some(at)))
            .col_expr(task::Column::UpdatedAt, Expr::value(at))
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(TaskStatus::Pending))
            .exec_with_returning(&self.db)
            .await?;

        Ok(updated.into_iter().next().map(Task::from))
    }

    async fn complete(
        &self,
        id: Uuid,
        at: OffsetDateTime,
        minutes: i32,
    ) -> AppResult<Option<Task>> {
        let updated = TaskEntity::update_many()
            .col_expr(
                task::Column::Status,
                Expr::value(TaskStatus::PendingReview),
            )
            .col_expr(task::Column::CompletedAt, Expr::value(Some(at)))
            .col_expr(task::Column::TimeSpentMinutes, Expr::value(Some(minutes)))
            .col_expr(task::Column::UpdatedAt, Expr::value(at))
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(TaskStatus::InProgress))
            .exec_with_returning(&self.db)
            .await?;

        Ok(updated.into_iter().next().map(Task::from))
    }

    async fn approve(&self, id: Uuid) -> AppResult<Option<Task>> {
        let updated = TaskEntity::update_many()
            .col_expr(task::Column::Status, Expr::value(TaskStatus::Completed))
            .col_expr(
                task::Column::UpdatedAt,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(TaskStatus::PendingReview))
            .exec_with_returning(&self.db)
            .await?;

        Ok(updated.into_iter().next().map(Task::from))
    }

    async fn reject(&self, id: Uuid) -> AppResult<Option<Task>> {
        let updated = TaskEntity::update_many()
            .col_expr(task::Column::Status, Expr::value(TaskStatus::InProgress))
            .col_expr(
                task::Column::CompletedAt,
                Expr::value(None::<OffsetDateTime>),
            )
            .col_expr(task::Column::TimeSpentMinutes, Expr::value(None::<i32>))
            .col_expr(
                task::Column::UpdatedAt,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(task::Column::Id.eq(id))
            .filter(task::Column::Status.eq(TaskStatus::PendingReview))
            .exec_with_returning(&self.db)
            .await?;

        Ok(updated.into_iter().next().map(Task::from))
    }
}

// Conversion from SeaORM models to our domain models

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            password_hash: m.password_hash,
            name: m.name,
            role: m.role,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<task::Model> for Task {
    fn from(m: task::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            status: m.status,
            deadline: m.deadline,
            user_id: m.user_id,
            started_at: m.started_at,
            completed_at: m.completed_at,
            time_spent_minutes: m.time_spent_minutes,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
