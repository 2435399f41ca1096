use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::common::{ok, ok_list, validate_email, validate_required, ApiBody};
use crate::middlewares::AuthUser;
use crate::models::{Role, UserPatch, UserResponse};
use crate::services::IdentityService;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    /// "admin" or "user"
    pub role: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedUser {
    pub id: Uuid,
}

// ============ Handlers ============

/// List every account. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/auth/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> AppResult<Json<ApiBody<Vec<UserResponse>>>> {
    let users = IdentityService::list_users(state.users.as_ref()).await?;
    let total = users.len() as u64;
    let users: Vec<UserResponse> = users.into_iter().map(Into::into).collect();
    Ok(ok_list(users, total))
}

/// Update an account's name, email or role. Admin only.
#[utoipa::path(
    patch,
    path = "/api/v1/auth/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Validation error or last-admin demotion"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<ApiBody<UserResponse>>> {
    if let Some(name) = payload.name.as_deref() {
        validate_required(name, "Name", 2, 255)?;
    }
    if let Some(email) = payload.email.as_deref() {
        validate_email(email)?;
    }
    let role = match payload.role.as_deref() {
        None => None,
        Some("admin") => Some(Role::Admin),
        Some("user") => Some(Role::User),
        Some(_) => {
            return Err(AppError::Validation(
                "Role must be either 'admin' or 'user'".to_string(),
            ))
        }
    };

    let patch = UserPatch {
        name: payload.name,
        email: payload.email,
        role,
    };
    let user = IdentityService::update_user(state.users.as_ref(), id, patch).await?;
    Ok(ok(user.into()))
}

/// Delete an account. Admin only; self-deletion and deleting the last
/// admin are refused.
#[utoipa::path(
    delete,
    path = "/api/v1/auth/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted user id", body = DeletedUser),
        (status = 400, description = "Self-deletion or last admin"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: AuthUser,
) -> AppResult<Json<ApiBody<DeletedUser>>> {
    let id = IdentityService::delete_user(state.users.as_ref(), id, actor.id).await?;
    Ok(ok(DeletedUser { id }))
}
