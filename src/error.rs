use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::models::TaskAction;

/// Application error type that can be returned from handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Authentication errors
    #[error("Authentication required. Please provide a valid token.")]
    MissingToken,

    #[error("User no longer exists.")]
    UserGone,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token.")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(&'static str),

    // Resource errors
    #[error("User not found")]
    UserNotFound,

    #[error("Task with id '{0}' not found")]
    TaskNotFound(Uuid),

    #[error("{0}")]
    RouteNotFound(String),

    #[error("User with this email already exists")]
    EmailExists,

    // Domain rule violations
    #[error("Cannot demote the last admin")]
    LastAdminDemote,

    #[error("Cannot delete the last admin")]
    LastAdminDelete,

    #[error("Cannot delete your own account")]
    SelfDelete,

    #[error("{}", .0.guard_message())]
    InvalidTransition(TaskAction),

    // Validation errors
    #[error("{0}")]
    Validation(String),

    // Internal errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// The one Forbidden shared by every admin-gated surface
    pub fn admin_required() -> Self {
        AppError::Forbidden("Admin access required.")
    }

    /// Machine-readable code carried beside every error message
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingToken | AppError::UserGone => "UNAUTHORIZED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::TaskNotFound(_) => "TASK_NOT_FOUND",
            AppError::RouteNotFound(_) => "NOT_FOUND",
            AppError::EmailExists => "EMAIL_EXISTS",
            AppError::LastAdminDemote | AppError::LastAdminDelete => "LAST_ADMIN",
            AppError::SelfDelete => "SELF_DELETE",
            AppError::InvalidTransition(_) => "INVALID_OPERATION",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingToken
            | AppError::UserGone
            | AppError::InvalidCredentials
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::TaskNotFound(_) | AppError::RouteNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::EmailExists => StatusCode::CONFLICT,
            AppError::LastAdminDemote
            | AppError::LastAdminDelete
            | AppError::SelfDelete
            | AppError::InvalidTransition(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error envelope: `{ "success": false, "error": { "code", "message" } }`
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal causes are logged, never serialized
        let message = match &self {
            AppError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                "An unexpected error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An unexpected error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorBody {
            success: false,
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        });

        (status, body).into_response()
    }
}

// Convenient conversions from common error types

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::InvalidToken
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
