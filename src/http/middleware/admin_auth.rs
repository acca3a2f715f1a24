use crate::error::ApiError;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use subtle::ConstantTimeEq;

pub const METRICS_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` does not match the configured key.
/// With no key configured every request is rejected.
pub async fn require_metrics_key(
    State(expected): State<Option<String>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(METRICS_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let authorized = match expected.as_deref() {
        Some(key) if !provided.is_empty() => {
            provided.len() == key.len() && bool::from(provided.as_bytes().ct_eq(key.as_bytes()))
        }
        _ => false,
    };

    if !authorized {
        return ApiError::Unauthorized("invalid or missing api key".to_string()).into_response();
    }

    next.run(request).await
}
