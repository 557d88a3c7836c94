//! # Tickbox API Server
//!
//! HTTP backend for the tickbox todo-list application: email/password
//! authentication plus todo CRUD, backed by PostgreSQL with a Redis
//! cache-aside layer on the paginated listing.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/tickbox \
//! REDIS_URL=redis://localhost:6379 \
//! JWT_SECRET=$(openssl rand -hex 32) \
//! cargo run -p tickbox-api
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use tickbox_api::app::{build_router, AppState};
use tickbox_api::config::Config;
use tickbox_api::middleware::auth::JwtAuthenticator;
use tickbox_api::middleware::rate_limit::RedisRateLimiter;
use tickbox_shared::cache::client::{RedisClient, RedisConfig};
use tickbox_shared::cache::listing::RedisListingCache;
use tickbox_shared::db::migrations::run_migrations;
use tickbox_shared::db::pool::{create_pool, DatabaseConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tickbox_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Tickbox API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    // Database pool + migrations
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    // Redis client shared by the listing cache and the rate limiter
    let redis = RedisClient::new(RedisConfig {
        url: config.redis.url.clone(),
        command_timeout_secs: 10,
    })
    .await?;

    let cache = Arc::new(RedisListingCache::new(redis.clone()));
    let authenticator = Arc::new(JwtAuthenticator::new(config.jwt.secret.clone()));
    let rate_limiter = Arc::new(RedisRateLimiter::new(
        redis,
        config.rate_limit.max_requests,
        config.rate_limit.window_secs,
    ));

    let bind_address = config.bind_address();
    let state = AppState::new(pool, cache, authenticator, rate_limiter, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves when the process receives ctrl-c or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl-c received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down gracefully"),
    }
}
