/// Sliding-window rate limiting middleware
///
/// Every `/api/v1` request is gated per client identifier before any other
/// processing. The identifier is the first `X-Forwarded-For` value when
/// present, otherwise the peer socket address.
///
/// # Algorithm
///
/// Weighted sliding window over fixed slots: requests are counted per
/// window-sized slot, and the effective count is the current slot's count
/// plus the previous slot's count weighted by how much of the previous
/// window still overlaps the sliding one. Slot state lives in Redis and the
/// count-and-increment runs as a Lua script, so concurrent requests cannot
/// race past the threshold.
///
/// # Headers
///
/// Responses carry:
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: requests left in the sliding window
/// - `X-RateLimit-Reset`: Unix timestamp when the current slot ends
///
/// # Failure policy
///
/// A Redis failure fails open: the error is logged and the request is
/// allowed through without headers.
///
/// Like the auth gate, the limiter is an injected strategy:
/// [`RedisRateLimiter`] in production, [`NullRateLimiter`] in tests.

use crate::{app::AppState, error::ApiError};
use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use tickbox_shared::cache::client::RedisClient;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy)]
pub struct RateLimitDecision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Requests allowed per window
    pub limit: u32,

    /// Requests left in the sliding window
    pub remaining: u32,

    /// Unix timestamp when the current slot ends
    pub reset: u64,
}

/// Rate limiting strategy
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Counts a request for `identifier`
    ///
    /// `Ok(None)` means this limiter does not limit (and no headers are
    /// emitted).
    async fn check(&self, identifier: &str) -> Result<Option<RateLimitDecision>, ApiError>;
}

/// No-op limiter for tests: every request passes, no headers
pub struct NullRateLimiter;

#[async_trait]
impl RateLimiter for NullRateLimiter {
    async fn check(&self, _identifier: &str) -> Result<Option<RateLimitDecision>, ApiError> {
        Ok(None)
    }
}

/// Redis-backed sliding-window limiter
#[derive(Clone)]
pub struct RedisRateLimiter {
    client: RedisClient,

    /// Requests allowed per window
    limit: u32,

    /// Window length in seconds
    window_secs: u64,
}

impl RedisRateLimiter {
    pub fn new(client: RedisClient, limit: u32, window_secs: u64) -> Self {
        Self {
            client,
            limit,
            window_secs,
        }
    }
}

/// Atomic count-and-increment over the current and previous window slots.
///
/// Returns `{allowed, remaining}`; the increment only happens when the
/// request is allowed, so rejected requests don't consume quota.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local curr_key = KEYS[1]
local prev_key = KEYS[2]
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local now = tonumber(ARGV[3])

local curr = tonumber(redis.call('GET', curr_key) or '0')
local prev = tonumber(redis.call('GET', prev_key) or '0')

local elapsed = now % window
local weight = (window - elapsed) / window
local count = curr + prev * weight

if count >= limit then
    return {0, 0}
end

curr = tonumber(redis.call('INCR', curr_key))
redis.call('EXPIRE', curr_key, window * 2)

local remaining = limit - (curr + prev * weight)
if remaining < 0 then
    remaining = 0
end

return {1, math.floor(remaining)}
"#;

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check(&self, identifier: &str) -> Result<Option<RateLimitDecision>, ApiError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before Unix epoch")
            .as_secs();

        let slot = window_slot(now, self.window_secs);
        let curr_key = format!("ratelimit:{}:{}", identifier, slot);
        let prev_key = format!("ratelimit:{}:{}", identifier, slot.wrapping_sub(1));

        let mut conn = self.client.get_connection();
        let script = redis::Script::new(SLIDING_WINDOW_SCRIPT);

        let result: Vec<i64> = script
            .key(&curr_key)
            .key(&prev_key)
            .arg(self.limit)
            .arg(self.window_secs)
            .arg(now)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| ApiError::Internal(format!("Rate limit check failed: {}", e)))?;

        Ok(Some(RateLimitDecision {
            allowed: result[0] == 1,
            limit: self.limit,
            remaining: result[1] as u32,
            reset: window_reset(now, self.window_secs),
        }))
    }
}

/// Slot index of the window containing `now`
fn window_slot(now: u64, window_secs: u64) -> u64 {
    now / window_secs
}

/// Unix timestamp at which the current slot ends
fn window_reset(now: u64, window_secs: u64) -> u64 {
    (window_slot(now, window_secs) + 1) * window_secs
}

/// Resolves the client identifier for a request
///
/// First `X-Forwarded-For` entry when present (the original client behind
/// proxies), otherwise the peer socket address.
fn client_identifier(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

/// Axum middleware applying the configured rate limiter
pub async fn rate_limit_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identifier = client_identifier(&req);

    let decision = match state.rate_limiter.check(&identifier).await {
        Ok(decision) => decision,
        Err(e) => {
            // Fail open
            tracing::warn!(error = %e, "Rate limiter unavailable, allowing request");
            None
        }
    };

    let Some(decision) = decision else {
        return Ok(next.run(req).await);
    };

    if !decision.allowed {
        return Err(ApiError::RateLimited {
            limit: decision.limit,
            remaining: 0,
            reset: decision.reset,
        });
    }

    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", numeric_header(decision.limit as u64));
    headers.insert(
        "X-RateLimit-Remaining",
        numeric_header(decision.remaining as u64),
    );
    headers.insert("X-RateLimit-Reset", numeric_header(decision.reset));

    Ok(response)
}

fn numeric_header(v: u64) -> HeaderValue {
    HeaderValue::from_str(&v.to_string()).expect("numeric header value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_window_slot() {
        assert_eq!(window_slot(0, 60), 0);
        assert_eq!(window_slot(59, 60), 0);
        assert_eq!(window_slot(60, 60), 1);
        assert_eq!(window_slot(1700000125, 60), 28333335);
    }

    #[test]
    fn test_window_reset_is_next_boundary() {
        assert_eq!(window_reset(0, 60), 60);
        assert_eq!(window_reset(59, 60), 60);
        assert_eq!(window_reset(60, 60), 120);
        assert_eq!(window_reset(125, 60), 180);
    }

    #[test]
    fn test_client_identifier_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_identifier(&req), "203.0.113.7");
    }

    #[test]
    fn test_client_identifier_falls_back_to_socket_addr() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("192.0.2.4:55555".parse::<SocketAddr>().unwrap()));

        assert_eq!(client_identifier(&req), "192.0.2.4");
    }

    #[test]
    fn test_client_identifier_default() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_identifier(&req), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_null_limiter_never_limits() {
        let limiter = NullRateLimiter;
        assert!(limiter.check("203.0.113.7").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_redis_limiter_enforces_threshold() {
        use tickbox_shared::cache::client::{RedisClient, RedisConfig};

        let client = RedisClient::new(RedisConfig {
            url: "redis://localhost:6379".to_string(),
            command_timeout_secs: 10,
        })
        .await
        .unwrap();

        let limiter = RedisRateLimiter::new(client, 3, 60);
        let id = format!("test-{}", uuid::Uuid::new_v4());

        for _ in 0..3 {
            let decision = limiter.check(&id).await.unwrap().unwrap();
            assert!(decision.allowed);
        }

        let decision = limiter.check(&id).await.unwrap().unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
    }
}
