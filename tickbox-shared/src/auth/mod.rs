/// Authentication utilities
///
/// This module provides the authentication primitives for tickbox:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength validation
/// - [`jwt`]: Session token generation and validation
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Session Tokens**: HS256 signing with a fixed 1 hour expiry
/// - **Constant-time Comparison**: Password verification uses constant-time
///   operations
///
/// # Example
///
/// ```no_run
/// use tickbox_shared::auth::password::{hash_password, verify_password};
/// use tickbox_shared::auth::jwt::{create_session_token, validate_session_token};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Password authentication
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// // Session token round-trip
/// let secret = "secret-key-at-least-32-bytes-long!!";
/// let user_id = Uuid::new_v4();
/// let token = create_session_token(user_id, secret)?;
/// let claims = validate_session_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
