/// Todo CRUD endpoints
///
/// - `POST /api/v1/create` - Create a todo
/// - `GET /api/v1/todo` (and `/todos`) - Paginated listing
/// - `PATCH /api/v1/todo/:id` - Partial update
/// - `DELETE /api/v1/todo/:id` - Delete
///
/// The listing read path is cache-aside: check the cache, fall back to a
/// single-snapshot database read on a miss, populate the cache with the
/// result. Every mutation invalidates the whole listing namespace, so the
/// next read after a write always refreshes from the database.
///
/// The listing is global: it returns todos from all users, matching the
/// upstream behavior this service replaces.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::CurrentUser,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tickbox_shared::{
    cache::listing::{PageMeta, TodoPage},
    models::todo::{CreateTodo, Todo, UpdateTodo},
};
use uuid::Uuid;

/// Default page when the query string is absent or unparseable
const DEFAULT_PAGE: u32 = 1;

/// Default page size when the query string is absent or unparseable
const DEFAULT_LIMIT: u32 = 10;

/// Hard cap on page size
const MAX_LIMIT: u32 = 100;

/// Create request
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    /// Title, 1-500 characters after trimming
    pub title: Option<String>,

    /// Initial completion flag (defaults to false)
    #[serde(default)]
    pub completed: bool,
}

/// Partial update request
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    /// New title, 1-500 characters after trimming
    pub title: Option<String>,

    /// New completion flag
    pub completed: Option<bool>,
}

/// Listing query parameters
///
/// Kept as raw strings: an unparseable value falls back to the default
/// instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Response envelope for a single todo
#[derive(Debug, Serialize)]
pub struct TodoResponse {
    pub success: bool,
    pub message: String,
    pub data: Todo,
}

/// Response envelope for the paginated listing
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub message: String,
    pub data: TodoPage,
}

/// Response envelope for deletion
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// Creates a todo
///
/// # Endpoint
///
/// ```text
/// POST /api/v1/create
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "title": "Buy milk", "completed": false }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing, empty, or over-long title
/// - `401 Unauthorized`: Missing/invalid session token
/// - `500 Internal Server Error`: Server error
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateTodoRequest>,
) -> ApiResult<(StatusCode, Json<TodoResponse>)> {
    let title = normalize_title(req.title.as_deref())?;

    let todo = Todo::create(
        &state.db,
        CreateTodo {
            title,
            completed: req.completed,
            user_id,
        },
    )
    .await?;

    invalidate_listings(&state).await;

    Ok((
        StatusCode::CREATED,
        Json(TodoResponse {
            success: true,
            message: "Todo created successfully".to_string(),
            data: todo,
        }),
    ))
}

/// Paginated listing with cache-aside reads
///
/// # Endpoint
///
/// ```text
/// GET /api/v1/todo?page=1&limit=10
/// Authorization: Bearer <token>
/// ```
///
/// On a cache hit the cached page is returned unchanged. On a miss the page
/// and total count are read from the database in one transaction, returned,
/// and stored in the cache with a 1 hour TTL.
pub async fn list_todos(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListResponse>> {
    let page = parse_page(query.page.as_deref());
    let limit = parse_limit(query.limit.as_deref());

    match state.cache.get(page, limit).await {
        Ok(Some(cached)) => {
            return Ok(Json(ListResponse {
                success: true,
                message: "Todos retrieved successfully".to_string(),
                data: cached,
            }));
        }
        Ok(None) => {}
        Err(e) => {
            // A broken cache degrades to plain database reads
            tracing::warn!(error = %e, "Listing cache read failed, falling back to database");
        }
    }

    let offset = i64::from(page - 1) * i64::from(limit);
    let (items, total) = Todo::list_page(&state.db, i64::from(limit), offset).await?;

    let result = TodoPage {
        data: items,
        meta: PageMeta::new(total, page, limit),
    };

    if let Err(e) = state.cache.put(page, limit, &result).await {
        tracing::warn!(error = %e, "Failed to populate listing cache");
    }

    Ok(Json(ListResponse {
        success: true,
        message: "Todos retrieved successfully".to_string(),
        data: result,
    }))
}

/// Partially updates a todo
///
/// # Endpoint
///
/// ```text
/// PATCH /api/v1/todo/:id
/// Authorization: Bearer <token>
/// Content-Type: application/json
///
/// { "title": "New title", "completed": true }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id or invalid title
/// - `401 Unauthorized`: Missing/invalid session token
/// - `404 Not Found`: No todo with that id
/// - `500 Internal Server Error`: Server error
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    let id = parse_todo_id(&id)?;

    let title = match req.title.as_deref() {
        Some(raw) => Some(normalize_title(Some(raw))?),
        None => None,
    };

    let todo = Todo::update(
        &state.db,
        id,
        UpdateTodo {
            title,
            completed: req.completed,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Record not found.".to_string()))?;

    invalidate_listings(&state).await;

    Ok(Json(TodoResponse {
        success: true,
        message: "Todo updated successfully".to_string(),
        data: todo,
    }))
}

/// Deletes a todo
///
/// # Endpoint
///
/// ```text
/// DELETE /api/v1/todo/:id
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed id
/// - `401 Unauthorized`: Missing/invalid session token
/// - `404 Not Found`: No todo with that id
/// - `500 Internal Server Error`: Server error
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let id = parse_todo_id(&id)?;

    let deleted = Todo::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Record not found.".to_string()));
    }

    invalidate_listings(&state).await;

    Ok(Json(DeleteResponse {
        success: true,
        message: "Todo deleted successfully".to_string(),
    }))
}

/// Trims and length-checks a title
fn normalize_title(raw: Option<&str>) -> Result<String, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::validation("title", "Title is required"))?;
    let title = raw.trim();

    if title.is_empty() {
        return Err(ApiError::validation("title", "Title cannot be empty"));
    }

    if title.chars().count() > 500 {
        return Err(ApiError::validation(
            "title",
            "Title must be less than 500 characters",
        ));
    }

    Ok(title.to_string())
}

/// Parses a well-formed todo id
fn parse_todo_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::validation("id", "Invalid todo ID format"))
}

/// Lenient page parsing: anything unusable becomes the default
fn parse_page(raw: Option<&str>) -> u32 {
    match raw.and_then(|s| s.parse::<u32>().ok()) {
        Some(page) if page >= 1 => page,
        _ => DEFAULT_PAGE,
    }
}

/// Lenient limit parsing: anything unusable becomes the default, and the
/// page size is capped
fn parse_limit(raw: Option<&str>) -> u32 {
    match raw.and_then(|s| s.parse::<u32>().ok()) {
        Some(limit) if limit >= 1 => limit.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    }
}

/// Clears every cached listing page after a mutation
///
/// Invalidation is not transactional with the write: a failure here leaves
/// stale entries until the next successful invalidation or TTL expiry, so
/// it is logged rather than failing the request.
async fn invalidate_listings(state: &AppState) {
    if let Err(e) = state.cache.invalidate_all().await {
        tracing::warn!(error = %e, "Failed to invalidate listing cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title(Some("  Buy milk  ")).unwrap(), "Buy milk");

        assert!(matches!(
            normalize_title(None),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            normalize_title(Some("   ")),
            Err(ApiError::Validation(_))
        ));

        let long = "x".repeat(501);
        assert!(matches!(
            normalize_title(Some(&long)),
            Err(ApiError::Validation(_))
        ));

        // Exactly 500 characters is fine
        let max = "x".repeat(500);
        assert_eq!(normalize_title(Some(&max)).unwrap().len(), 500);
    }

    #[test]
    fn test_parse_todo_id() {
        assert!(parse_todo_id("3fa85f64-5717-4562-b3fc-2c963f66afa6").is_ok());
        assert!(parse_todo_id("not-a-uuid").is_err());
        assert!(parse_todo_id("").is_err());
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None), 10);
        assert_eq!(parse_limit(Some("25")), 25);
        assert_eq!(parse_limit(Some("0")), 10);
        assert_eq!(parse_limit(Some("abc")), 10);
        assert_eq!(parse_limit(Some("1000")), 100);
    }
}
