/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// Every dependency a handler touches — the database pool, the listing
/// cache, the authenticator, the rate limiter — is constructed at startup
/// and injected here. Tests swap in doubles (`MemoryListingCache`,
/// `StaticAuthenticator`, `NullRateLimiter`) without any environment
/// branching.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tickbox_api::app::{AppState, build_router};
/// use tickbox_api::config::Config;
/// use tickbox_api::middleware::auth::JwtAuthenticator;
/// use tickbox_api::middleware::rate_limit::NullRateLimiter;
/// use tickbox_shared::cache::listing::MemoryListingCache;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
///
/// let state = AppState::new(
///     pool,
///     Arc::new(MemoryListingCache::new()),
///     Arc::new(JwtAuthenticator::new(config.jwt.secret.clone())),
///     Arc::new(NullRateLimiter),
///     config,
/// );
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    middleware::{auth::Authenticator, rate_limit::RateLimiter, security::SecurityHeadersLayer},
    routes,
};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Instant;
use tickbox_shared::cache::listing::ListingCache;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Listing cache (Redis in production, in-memory in tests)
    pub cache: Arc<dyn ListingCache>,

    /// Token verification strategy for the auth gate
    pub authenticator: Arc<dyn Authenticator>,

    /// Rate limiting strategy
    pub rate_limiter: Arc<dyn RateLimiter>,

    /// Application configuration
    pub config: Arc<Config>,

    /// Process start time, reported by the health endpoints
    pub started_at: Instant,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        db: PgPool,
        cache: Arc<dyn ListingCache>,
        authenticator: Arc<dyn Authenticator>,
        rate_limiter: Arc<dyn RateLimiter>,
        config: Config,
    ) -> Self {
        Self {
            db,
            cache,
            authenticator,
            rate_limiter,
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Gets the session token signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    /// Seconds since the server started
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health/                  # Health checks (public)
/// │   ├── GET /live
/// │   ├── GET /ready
/// │   └── GET /database
/// └── /api/v1/                  # API v1 (rate limited)
///     ├── /auth/                # Authentication (public)
///     │   ├── POST /sign-up
///     │   └── POST /login
///     ├── POST   /create        # Todos (auth gate)
///     ├── GET    /todo
///     ├── GET    /todos
///     ├── PATCH  /todo/:id
///     └── DELETE /todo/:id
/// ```
///
/// # Middleware Stack
///
/// Applied in order (outermost first): security headers, CORS, request
/// tracing, then per-group rate limiting and the auth gate.
pub fn build_router(state: AppState) -> Router {
    // Health checks (public, not rate limited: probes must always land)
    let health_routes = Router::new()
        .route("/live", get(routes::health::live))
        .route("/ready", get(routes::health::ready))
        .route("/database", get(routes::health::database));

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/sign-up", post(routes::auth::sign_up))
        .route("/login", post(routes::auth::login));

    // Todo routes (require a valid session token)
    let todo_routes = Router::new()
        .route("/create", post(routes::todos::create_todo))
        .route("/todo", get(routes::todos::list_todos))
        .route("/todos", get(routes::todos::list_todos))
        .route(
            "/todo/:id",
            axum::routing::patch(routes::todos::update_todo).delete(routes::todos::delete_todo),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_gate,
        ));

    // The whole v1 surface sits behind the rate limiter
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(todo_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::rate_limit::rate_limit_gate,
        ));

    // Configure CORS based on configuration
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .nest("/health", health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
