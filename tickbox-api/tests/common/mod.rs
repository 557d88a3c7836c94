/// Common test utilities for integration tests
///
/// Hermetic tests build the real router against injected doubles: a lazy
/// database pool (never connected — these tests stop at validation, auth,
/// or the cache), an in-memory listing cache, and a no-op rate limiter.
/// Token verification is real: requests are authenticated with tokens
/// minted from the test secret.

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tickbox_api::app::{build_router, AppState};
use tickbox_api::config::{
    ApiConfig, Config, DatabaseConfig, JwtConfig, RateLimitConfig, RedisConfig,
};
use tickbox_api::middleware::auth::JwtAuthenticator;
use tickbox_api::middleware::rate_limit::{NullRateLimiter, RateLimiter};
use tickbox_shared::auth::jwt::create_session_token;
use tickbox_shared::cache::listing::MemoryListingCache;
use uuid::Uuid;

/// Signing secret shared by the test authenticator and minted tokens
pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing the router and its injected doubles
pub struct TestContext {
    pub app: Router,
    pub cache: Arc<MemoryListingCache>,
    pub user_id: Uuid,
}

/// Configuration used by hermetic tests
///
/// The database URL points nowhere reachable on purpose; hermetic tests
/// must never issue a query.
pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://localhost:1/tickbox_test_unreachable".to_string(),
            max_connections: 2,
        },
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
        },
        redis: RedisConfig {
            url: "redis://localhost:1".to_string(),
        },
        rate_limit: RateLimitConfig {
            window_secs: 60,
            max_requests: 30,
        },
    }
}

impl TestContext {
    /// Creates a context with rate limiting disabled
    pub fn new() -> Self {
        Self::with_rate_limiter(Arc::new(NullRateLimiter))
    }

    /// Creates a context with a specific rate limiting strategy
    pub fn with_rate_limiter(rate_limiter: Arc<dyn RateLimiter>) -> Self {
        let config = test_config();

        // Lazy pool: no connection is attempted until a query runs
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect_lazy(&config.database.url)
            .expect("lazy pool creation cannot fail");

        let cache = Arc::new(MemoryListingCache::new());

        let state = AppState::new(
            pool,
            cache.clone(),
            Arc::new(JwtAuthenticator::new(JWT_SECRET)),
            rate_limiter,
            config,
        );

        TestContext {
            app: build_router(state),
            cache,
            user_id: Uuid::new_v4(),
        }
    }

    /// Returns a valid authorization header value for the test user
    pub fn auth_header(&self) -> String {
        let token = create_session_token(self.user_id, JWT_SECRET).expect("token creation");
        format!("Bearer {}", token)
    }
}
