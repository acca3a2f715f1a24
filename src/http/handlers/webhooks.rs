use crate::error::ApiError;
use crate::http::extract::{Json, RawBody};
use crate::webhooks::signature::{self, SignatureScheme};
use crate::webhooks::{cashfree, razorpay};
use crate::AppState;
use axum::extract::State;
use axum::http::HeaderMap;
use serde_json::{json, Value};

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok()).map(str::trim)
}

/// Signature is checked against the exact bytes received, before any parsing.
pub async fn razorpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawBody(body): RawBody,
) -> Result<Json<Value>, ApiError> {
    signature::verify(
        state.webhook_secrets.razorpay.as_deref(),
        None,
        &body,
        header(&headers, razorpay::SIGNATURE_HEADER),
        SignatureScheme::RAZORPAY,
    )
    .inspect_err(|e| tracing::warn!(gateway = "razorpay", error = %e, "webhook rejected"))?;

    let event = razorpay::parse_event(&body)?;
    let outcome = state.webhook_service.apply(event).await?;
    tracing::debug!(gateway = "razorpay", ?outcome, "webhook processed");

    Ok(Json(json!({ "status": "success" })))
}

pub async fn cashfree_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawBody(body): RawBody,
) -> Result<Json<Value>, ApiError> {
    signature::verify(
        state.webhook_secrets.cashfree.as_deref(),
        header(&headers, cashfree::TIMESTAMP_HEADER),
        &body,
        header(&headers, cashfree::SIGNATURE_HEADER),
        SignatureScheme::CASHFREE,
    )
    .inspect_err(|e| tracing::warn!(gateway = "cashfree", error = %e, "webhook rejected"))?;

    let event = cashfree::parse_event(&body)?;
    let outcome = state.webhook_service.apply(event).await?;
    tracing::debug!(gateway = "cashfree", ?outcome, "webhook processed");

    Ok(Json(json!({ "status": "success" })))
}
