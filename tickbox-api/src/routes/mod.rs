/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoints
/// - `auth`: Authentication endpoints (sign-up, login)
/// - `todos`: Todo CRUD endpoints

pub mod auth;
pub mod health;
pub mod todos;

use crate::error::{ApiError, FieldError};

/// Flattens validator errors into the field-level error list the API
/// returns on 400s
pub(crate) fn validation_errors(e: validator::ValidationErrors) -> ApiError {
    let errors: Vec<FieldError> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();
    ApiError::Validation(errors)
}
