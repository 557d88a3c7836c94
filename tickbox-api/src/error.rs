/// Error handling for the API server
///
/// This module provides a unified error type that maps to HTTP responses.
/// All handlers return `Result<T, ApiError>` which converts to the
/// appropriate status code, and every error body has the same shape:
///
/// ```json
/// { "success": false, "message": "...", "errors": [{"field": "...", "message": "..."}] }
/// ```
///
/// (`errors` only on validation failures.)
///
/// Store- and auth-layer error codes are translated here, once, via `From`
/// impls; handlers never re-interpret them.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Request input failed validation (400)
    Validation(Vec<FieldError>),

    /// Missing/invalid/expired token or bad credentials (401)
    Unauthorized(String),

    /// Entity id absent (404)
    NotFound(String),

    /// Uniqueness violation (409)
    Conflict(String),

    /// Rate limit exceeded (429)
    RateLimited {
        limit: u32,
        remaining: u32,
        reset: u64,
    },

    /// Unexpected failure (500)
    Internal(String),

    /// Downstream dependency unreachable (503)
    ServiceUnavailable(String),
}

/// One field-level validation failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false
    pub success: bool,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl ApiError {
    /// Shorthand for a single-field validation error
    pub fn validation(field: &str, message: &str) -> Self {
        ApiError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.to_string(),
        }])
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::RateLimited { .. } => write!(f, "Rate limit exceeded"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Rate limiting carries its own headers
        if let ApiError::RateLimited {
            limit,
            remaining,
            reset,
        } = &self
        {
            let body = Json(ErrorBody {
                success: false,
                message: "Too many requests, please try again in a minute.".to_string(),
                errors: None,
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", header_value(*limit as u64));
            headers.insert("X-RateLimit-Remaining", header_value(*remaining as u64));
            headers.insert("X-RateLimit-Reset", header_value(*reset));
            return response;
        }

        let (status, message, errors) = match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation Error".to_string(),
                Some(errors),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::RateLimited { .. } => unreachable!("handled above"),
            ApiError::Internal(msg) => {
                // Log internal details but never expose them to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong!".to_string(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
        };

        let body = Json(ErrorBody {
            success: false,
            message,
            errors,
        });

        (status, body).into_response()
    }
}

fn header_value(v: u64) -> HeaderValue {
    // Numeric values always render as valid header strings
    HeaderValue::from_str(&v.to_string()).expect("numeric header value")
}

/// Convert sqlx errors to API errors
///
/// Unique-constraint violations become `Conflict`, missing rows become
/// `NotFound`, everything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found.".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("email") {
                        return ApiError::Conflict("The email is already taken.".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }

                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Convert session token errors to API errors
///
/// Every token failure is a 401; the distinction only matters for logs.
impl From<tickbox_shared::auth::jwt::JwtError> for ApiError {
    fn from(err: tickbox_shared::auth::jwt::JwtError) -> Self {
        match err {
            tickbox_shared::auth::jwt::JwtError::Expired => {
                ApiError::Unauthorized("Unauthorized".to_string())
            }
            _ => {
                tracing::debug!("Token validation failed: {}", err);
                ApiError::Unauthorized("Unauthorized".to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<tickbox_shared::auth::password::PasswordError> for ApiError {
    fn from(err: tickbox_shared::auth::password::PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

/// Convert cache errors to API errors
impl From<tickbox_shared::cache::listing::CacheError> for ApiError {
    fn from(err: tickbox_shared::cache::listing::CacheError) -> Self {
        ApiError::Internal(format!("Cache operation failed: {}", err))
    }
}
