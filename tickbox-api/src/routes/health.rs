/// Health check endpoints
///
/// Three probes, all public:
///
/// - `GET /health/live` - process is up, always 200
/// - `GET /health/ready` - database and cache both reachable, else 503
/// - `GET /health/database` - detailed status payload for dashboards
///
/// Without these, orchestrators route traffic to dead instances: liveness
/// restarts a hung process, readiness holds traffic until dependencies
/// respond.

use crate::app::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct LiveResponse {
    pub status: String,
}

/// Readiness response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub database: bool,
    pub redis: bool,
}

/// Per-service status strings in the detailed payload
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub database: String,
    pub redis: String,
}

/// Detailed health payload
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealthResponse {
    pub status: String,
    pub uptime: u64,
    pub timestamp: String,
    pub services: ServiceStatus,
}

/// Liveness probe: the process is running
pub async fn live() -> Json<LiveResponse> {
    Json(LiveResponse {
        status: "alive".to_string(),
    })
}

/// Readiness probe: both downstream dependencies respond
pub async fn ready(State(state): State<AppState>) -> Response {
    let database = sqlx::query("SELECT 1").fetch_one(&state.db).await.is_ok();
    let redis = state.cache.healthy().await;

    let status = if database && redis {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = ReadyResponse {
        status: if status == StatusCode::OK {
            "ready".to_string()
        } else {
            "not_ready".to_string()
        },
        database,
        redis,
    };

    (status, Json(body)).into_response()
}

/// Detailed health payload including uptime and per-service status
pub async fn database(State(state): State<AppState>) -> Response {
    if sqlx::query("SELECT 1").fetch_one(&state.db).await.is_err() {
        let body = serde_json::json!({
            "status": "error",
            "message": "Failed to connect to the Database",
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    }

    let redis_ok = state.cache.healthy().await;

    let body = DatabaseHealthResponse {
        status: "Active".to_string(),
        uptime: state.uptime_secs(),
        timestamp: Utc::now().to_rfc3339(),
        services: ServiceStatus {
            database: "Connected".to_string(),
            redis: if redis_ok {
                "Connected".to_string()
            } else {
                "Failed to Connect to Redis".to_string()
            },
        },
    };

    (StatusCode::OK, Json(body)).into_response()
}
