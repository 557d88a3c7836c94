/// Todo model and database operations
///
/// Todos are created by authenticated users, partially updated (title and/or
/// completed flag) and deleted by id. Listing is paginated and ordered by
/// creation time, newest first.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE todos (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(500) NOT NULL,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use tickbox_shared::models::todo::{Todo, CreateTodo};
/// use tickbox_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let todo = Todo::create(&pool, CreateTodo {
///     title: "Buy milk".to_string(),
///     completed: false,
///     user_id: Uuid::new_v4(),
/// }).await?;
///
/// let (items, total) = Todo::list_page(&pool, 10, 0).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A todo item
///
/// Serialized with camelCase field names for the JSON API (`userId`,
/// `createdAt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique todo ID (UUID v4)
    pub id: Uuid,

    /// Title, non-empty, at most 500 characters
    pub title: String,

    /// Completion flag
    pub completed: bool,

    /// Owning user
    pub user_id: Uuid,

    /// When the todo was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new todo
#[derive(Debug, Clone)]
pub struct CreateTodo {
    /// Title (already trimmed and length-checked by the validation layer)
    pub title: String,

    /// Initial completion flag
    pub completed: bool,

    /// Owning user
    pub user_id: Uuid,
}

/// Input for partially updating a todo
///
/// Only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodo {
    /// New title
    pub title: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

impl UpdateTodo {
    /// True when no field would be written
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }
}

impl Todo {
    /// Creates a new todo in the database
    pub async fn create(pool: &PgPool, data: CreateTodo) -> Result<Self, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (title, completed, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, title, completed, user_id, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.completed)
        .bind(data.user_id)
        .fetch_one(pool)
        .await?;

        Ok(todo)
    }

    /// Finds a todo by ID
    ///
    /// # Returns
    ///
    /// The todo if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, completed, user_id, created_at
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(todo)
    }

    /// Reads one listing page together with the total count
    ///
    /// Both reads run inside a single transaction so the count can never
    /// disagree with the page contents. Ordered by creation time, newest
    /// first.
    ///
    /// # Returns
    ///
    /// `(items, total_items)`
    pub async fn list_page(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Self>, i64), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let items = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, title, completed, user_id, created_at
            FROM todos
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&mut *tx)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok((items, total))
    }

    /// Partially updates a todo
    ///
    /// Only non-None fields in `data` are written.
    ///
    /// # Returns
    ///
    /// The updated todo if found, None if the id doesn't exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTodo,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(pool, id).await;
        }

        // Build the update dynamically based on which fields are present
        let mut assignments: Vec<String> = Vec::new();
        let mut bind_count = 1;

        if data.title.is_some() {
            bind_count += 1;
            assignments.push(format!("title = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            assignments.push(format!("completed = ${}", bind_count));
        }

        let query = format!(
            "UPDATE todos SET {} WHERE id = $1 RETURNING id, title, completed, user_id, created_at",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Todo>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let todo = q.fetch_optional(pool).await?;

        Ok(todo)
    }

    /// Deletes a todo by ID
    ///
    /// # Returns
    ///
    /// True if the todo was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
