use axum::{
    http::{Method, StatusCode, Uri},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

// ============ Response envelope ============

/// Success envelope: `{ "success": true, "data": ..., "meta"? }`
#[derive(Debug, Serialize)]
pub struct ApiBody<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ListMeta>,
}

#[derive(Debug, Serialize)]
pub struct ListMeta {
    pub total: u64,
}

pub fn ok<T>(data: T) -> Json<ApiBody<T>> {
    Json(ApiBody {
        success: true,
        data,
        meta: None,
    })
}

pub fn ok_list<T>(data: T, total: u64) -> Json<ApiBody<T>> {
    Json(ApiBody {
        success: true,
        data,
        meta: Some(ListMeta { total }),
    })
}

pub fn created<T>(data: T) -> (StatusCode, Json<ApiBody<T>>) {
    (
        StatusCode::CREATED,
        Json(ApiBody {
            success: true,
            data,
            meta: None,
        }),
    )
}

// ============ Field validation ============

pub fn validate_required(value: &str, field: &str, min: usize, max: usize) -> AppResult<()> {
    let len = value.chars().count();
    if len == 0 {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    if len < min {
        return Err(AppError::Validation(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    if len > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn validate_optional(value: Option<&str>, field: &str, max: usize) -> AppResult<()> {
    if let Some(value) = value {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.chars().count() > 255 || !EMAIL_RE.is_match(email) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    Ok(())
}

// ============ Tri-state patch fields ============

/// Distinguishes an absent field from an explicit null. Pair with
/// `#[serde(default)]`: absent stays `None`, null becomes `Some(None)`,
/// a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// `double_option` for RFC 3339 timestamp fields
pub fn double_option_rfc3339<'de, D>(de: D) -> Result<Option<Option<OffsetDateTime>>, D::Error>
where
    D: Deserializer<'de>,
{
    time::serde::rfc3339::option::deserialize(de).map(Some)
}

// ============ Service routes ============

/// Liveness probe; deliberately outside the response envelope
pub async fn health() -> Json<serde_json::Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();
    Json(serde_json::json!({ "status": "ok", "timestamp": timestamp }))
}

/// 404 for unmatched routes, rendered in the error envelope
pub async fn route_fallback(method: Method, uri: Uri) -> AppError {
    AppError::RouteNotFound(format!("Route {} {} not found", method, uri.path()))
}
