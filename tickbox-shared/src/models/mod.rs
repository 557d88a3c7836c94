/// Database models for tickbox
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts (email + password hash)
/// - `todo`: Todo items owned by users
///
/// # Example
///
/// ```no_run
/// use tickbox_shared::models::user::{User, CreateUser};
/// use tickbox_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// # Ok(())
/// # }
/// ```

pub mod todo;
pub mod user;
