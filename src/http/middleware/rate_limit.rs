use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use redis::AsyncCommands;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct RateLimitState {
    /// `None` disables limiting entirely.
    pub redis_client: Option<redis::Client>,
    pub window_secs: u64,
    pub max_requests: i64,
}

fn client_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Fixed-window counter per client IP. Fails open when Redis is unreachable.
pub async fn enforce(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(client) = &state.redis_client else {
        return next.run(request).await;
    };

    let window = state.window_secs.max(1);
    let bucket = chrono::Utc::now().timestamp() as u64 / window;
    let key = format!("rate:{}:{}", client_ip(&request), bucket);

    match client.get_multiplexed_async_connection().await {
        Ok(mut conn) => {
            let count: i64 = conn.incr(&key, 1).await.unwrap_or(1);
            if count == 1 {
                let _: bool = conn.expire(&key, window as i64 * 2).await.unwrap_or(false);
            }
            if count > state.max_requests {
                tracing::warn!(%key, count, "rate limit exceeded");
                return (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(serde_json::json!({
                        "error": {
                            "code": "RATE_LIMITED",
                            "message": "too many requests, try again later",
                            "error_id": uuid::Uuid::new_v4(),
                        }
                    })),
                )
                    .into_response();
            }
        }
        Err(e) => tracing::debug!(error = %e, "rate limiter unavailable, allowing request"),
    }

    next.run(request).await
}
