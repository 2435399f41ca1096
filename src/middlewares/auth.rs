use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Role, User};
use crate::services::AuthService;
use crate::state::AppState;

/// Authenticated user info for the current request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Extractor for AuthUser - can be used directly in handlers
/// Example: `async fn handler(user: AuthUser) -> ... { }`
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::MissingToken)
    }
}

/// Auth middleware - validates JWT and injects AuthUser into request extensions.
///
/// The user is re-fetched from the store on every request, so a role change
/// applies to the next call and a deleted account stops authenticating even
/// while its token is still unexpired.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract token from Authorization header
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::MissingToken)?;

    // Verify token and get claims
    let claims = AuthService::verify_token(token, &state.config)?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::UserGone)?;

    // Insert AuthUser into request extensions
    request.extensions_mut().insert(AuthUser::from(user));

    // Continue to handler
    Ok(next.run(request).await)
}

/// Rejects non-admins; layered inside `auth_middleware` on roster routes
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::MissingToken)?;

    if !user.role.is_admin() {
        return Err(AppError::admin_required());
    }
    Ok(next.run(request).await)
}
