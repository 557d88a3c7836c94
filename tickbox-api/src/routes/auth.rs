/// Authentication endpoints
///
/// - `POST /api/v1/auth/sign-up` - Register a new user
/// - `POST /api/v1/auth/login` - Verify credentials and issue a session token
///
/// Emails are normalized (trimmed, lowercased) before validation and
/// lookup. Password hashing and verification are CPU-bound, so both run on
/// a blocking thread rather than the async workers handling other requests.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::validation_errors,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tickbox_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, User},
};
use validator::Validate;

/// Sign-up request
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (strength-checked separately)
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// The user fields exposed over the wire
///
/// The password hash never leaves the service.
#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub email: String,
}

/// Sign-up response
#[derive(Debug, Serialize)]
pub struct SignUpResponse {
    pub success: bool,
    pub message: String,
    pub user: UserPayload,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserPayload,
}

/// Registers a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/sign-up
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "Password@123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email or weak password
/// - `409 Conflict`: Email already registered
/// - `500 Internal Server Error`: Server error
pub async fn sign_up(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SignUpResponse>)> {
    // Normalize before validation so " User@Example.com " passes the format
    // check and lands in the store in canonical form
    let mut req = req;
    req.email = req.email.trim().to_lowercase();
    req.validate().map_err(validation_errors)?;

    password::validate_password_strength(&req.password)
        .map_err(|message| ApiError::validation("password", &message))?;

    // Argon2id is deliberately expensive; keep it off the async workers
    let raw_password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&raw_password))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))??;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            success: true,
            message: "User registered successfully".to_string(),
            user: UserPayload { email: user.email },
        }),
    ))
}

/// Verifies credentials and issues a session token
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/auth/login
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "Password@123" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Invalid email format
/// - `404 Not Found`: Unknown email
/// - `401 Unauthorized`: Wrong password
/// - `500 Internal Server Error`: Server error
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let mut req = req;
    req.email = req.email.trim().to_lowercase();
    req.validate().map_err(validation_errors)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid credentials".to_string()))?;

    let raw_password = req.password;
    let stored_hash = user.password_hash.clone();
    let valid =
        tokio::task::spawn_blocking(move || password::verify_password(&raw_password, &stored_hash))
            .await
            .map_err(|e| ApiError::Internal(format!("Verification task failed: {}", e)))??;

    if !valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = jwt::create_session_token(user.id, state.jwt_secret())?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token,
        user: UserPayload { email: user.email },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_up_request_validates_email() {
        let req = SignUpRequest {
            email: "not-an-email".to_string(),
            password: "Password@123".to_string(),
        };
        assert!(req.validate().is_err());

        let req = SignUpRequest {
            email: "user@example.com".to_string(),
            password: "Password@123".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_email_normalization() {
        let email = "  User@Example.COM ".trim().to_lowercase();
        assert_eq!(email, "user@example.com");
    }
}
