use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::handlers::common::{created, ok, validate_email, validate_required, ApiBody};
use crate::middlewares::AuthUser;
use crate::models::UserResponse;
use crate::services::IdentityService;
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ============ Handlers ============

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiBody<AuthResponse>>)> {
    validate_required(&payload.name, "Name", 2, 255)?;
    validate_email(&payload.email)?;
    validate_required(&payload.password, "Password", 6, 100)?;

    let (user, token) = IdentityService::register(
        state.users.as_ref(),
        &state.config,
        payload.name,
        payload.email,
        payload.password,
    )
    .await?;

    Ok(created(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiBody<AuthResponse>>> {
    validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password is required".to_string()));
    }

    let (user, token) = IdentityService::login(
        state.users.as_ref(),
        &state.config,
        &payload.email,
        &payload.password,
    )
    .await?;

    Ok(ok(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiBody<UserResponse>>> {
    let user = IdentityService::profile(state.users.as_ref(), user.id).await?;
    Ok(ok(user.into()))
}
