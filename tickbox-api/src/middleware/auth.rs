/// Auth gate middleware
///
/// Protected routes pass through this gate before any handler runs. The gate
/// extracts the bearer token from the `Authorization` header, hands it to
/// the configured [`Authenticator`], and on success attaches the resolved
/// user id to the request as a [`CurrentUser`] extension. Any failure —
/// missing header, malformed header, bad signature, expired token — is a
/// 401.
///
/// The verification strategy is injected at construction time:
/// [`JwtAuthenticator`] in production, [`StaticAuthenticator`] in tests that
/// need a fixed identity without minting tokens. There is no
/// environment-variable branching in the request path.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tickbox_shared::auth::jwt::validate_session_token;
use uuid::Uuid;

/// The authenticated user id, attached to protected requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Verification strategy for the auth gate
pub trait Authenticator: Send + Sync {
    /// Resolves a user id from the bearer token, if any
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` when the request cannot be
    /// authenticated.
    fn authenticate(&self, bearer: Option<&str>) -> Result<Uuid, ApiError>;
}

/// Production authenticator: validates signed session tokens
pub struct JwtAuthenticator {
    secret: String,
}

impl JwtAuthenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Uuid, ApiError> {
        let token = bearer.ok_or_else(|| ApiError::Unauthorized("Unauthorized".to_string()))?;
        let claims = validate_session_token(token, &self.secret)?;
        Ok(claims.sub)
    }
}

/// Test authenticator: resolves every request to a fixed user id
///
/// The injected replacement for the original's test-mode bypass; only test
/// setups should construct this.
pub struct StaticAuthenticator {
    user_id: Uuid,
}

impl StaticAuthenticator {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

impl Authenticator for StaticAuthenticator {
    fn authenticate(&self, _bearer: Option<&str>) -> Result<Uuid, ApiError> {
        Ok(self.user_id)
    }
}

/// Axum middleware applying the configured authenticator
///
/// On success the request continues with a [`CurrentUser`] extension; on
/// failure the request is rejected with 401 before reaching the handler.
pub async fn auth_gate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let user_id = state.authenticator.authenticate(bearer)?;

    req.extensions_mut().insert(CurrentUser(user_id));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickbox_shared::auth::jwt::create_session_token;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_jwt_authenticator_accepts_valid_token() {
        let user_id = Uuid::new_v4();
        let token = create_session_token(user_id, SECRET).unwrap();

        let authenticator = JwtAuthenticator::new(SECRET);
        let resolved = authenticator.authenticate(Some(&token)).unwrap();

        assert_eq!(resolved, user_id);
    }

    #[test]
    fn test_jwt_authenticator_rejects_missing_token() {
        let authenticator = JwtAuthenticator::new(SECRET);
        let result = authenticator.authenticate(None);

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_jwt_authenticator_rejects_garbage_token() {
        let authenticator = JwtAuthenticator::new(SECRET);
        let result = authenticator.authenticate(Some("not-a-token"));

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_jwt_authenticator_rejects_wrong_secret() {
        let token = create_session_token(Uuid::new_v4(), SECRET).unwrap();

        let authenticator = JwtAuthenticator::new("another-secret-key-32-bytes-long!!!");
        let result = authenticator.authenticate(Some(&token));

        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_static_authenticator_ignores_token() {
        let user_id = Uuid::new_v4();
        let authenticator = StaticAuthenticator::new(user_id);

        assert_eq!(authenticator.authenticate(None).unwrap(), user_id);
        assert_eq!(authenticator.authenticate(Some("anything")).unwrap(), user_id);
    }
}
