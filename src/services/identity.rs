use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, Role, User, UserPatch};
use crate::services::AuthService;
use crate::store::{UserDelete, UserStore, UserUpdate};

/// Account registration, login and admin roster management
pub struct IdentityService;

impl IdentityService {
    /// Register a new account. Self-registration never grants admin; the
    /// only paths to the admin role are seeding and promotion by an admin.
    pub async fn register(
        users: &dyn UserStore,
        config: &Config,
        name: String,
        email: String,
        password: String,
    ) -> AppResult<(User, String)> {
        if users.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailExists);
        }

        let password_hash = AuthService::hash_password(&password)?;
        let user = users
            .create(NewUser {
                name,
                email,
                password_hash,
                role: Role::User,
            })
            .await?;
        let token = AuthService::generate_token(&user, config)?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok((user, token))
    }

    /// Verify credentials and mint a token. Unknown email and wrong
    /// password are indistinguishable to the caller.
    pub async fn login(
        users: &dyn UserStore,
        config: &Config,
        email: &str,
        password: &str,
    ) -> AppResult<(User, String)> {
        let Some(user) = users.find_by_email(email).await? else {
            return Err(AppError::InvalidCredentials);
        };

        if !AuthService::verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "failed login attempt");
            return Err(AppError::InvalidCredentials);
        }

        let token = AuthService::generate_token(&user, config)?;
        Ok((user, token))
    }

    pub async fn profile(users: &dyn UserStore, id: Uuid) -> AppResult<User> {
        users.find_by_id(id).await?.ok_or(AppError::UserNotFound)
    }

    pub async fn list_users(users: &dyn UserStore) -> AppResult<Vec<User>> {
        users.all().await
    }

    /// Partial update of name / email / role. The store refuses to demote
    /// the only remaining admin.
    pub async fn update_user(
        users: &dyn UserStore,
        target: Uuid,
        patch: UserPatch,
    ) -> AppResult<User> {
        let role_change = patch.role;
        match users.update(target, patch).await? {
            UserUpdate::Applied(user) => {
                if let Some(role) = role_change {
                    tracing::info!(user_id = %user.id, role = role.as_str(), "user role changed");
                }
                Ok(user)
            }
            UserUpdate::Missing => Err(AppError::UserNotFound),
            UserUpdate::EmailTaken => Err(AppError::EmailExists),
            UserUpdate::LastAdmin => Err(AppError::LastAdminDemote),
        }
    }

    /// Delete an account. Admins cannot delete themselves, and the only
    /// remaining admin cannot be deleted at all. The target's tasks are
    /// unassigned, not removed.
    pub async fn delete_user(users: &dyn UserStore, target: Uuid, actor: Uuid) -> AppResult<Uuid> {
        if target == actor {
            return Err(AppError::SelfDelete);
        }

        match users.delete(target).await? {
            UserDelete::Deleted => {
                tracing::info!(user_id = %target, "user deleted");
                Ok(target)
            }
            UserDelete::Missing => Err(AppError::UserNotFound),
            UserDelete::LastAdmin => Err(AppError::LastAdminDelete),
        }
    }

    /// Create the bootstrap admin unless the email is already registered.
    /// Returns whether an account was created.
    pub async fn seed_admin(
        users: &dyn UserStore,
        name: &str,
        email: &str,
        password: &str,
    ) -> AppResult<bool> {
        if users.find_by_email(email).await?.is_some() {
            tracing::info!(email, "admin account already exists, skipping seed");
            return Ok(false);
        }

        let password_hash = AuthService::hash_password(password)?;
        let user = users
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await?;

        tracing::info!(user_id = %user.id, "seeded admin account");
        Ok(true)
    }
}
