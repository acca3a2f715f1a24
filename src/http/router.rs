use crate::http::handlers::{ops, payments, webhooks};
use crate::http::middleware::admin_auth::require_metrics_key;
use crate::http::middleware::error_details::attach_error_details;
use crate::http::middleware::rate_limit::{self, RateLimitState};
use crate::http::middleware::request_metrics;
use crate::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct RouterSettings {
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub rate_limit: RateLimitState,
    pub metrics_api_key: Option<String>,
    pub expose_error_details: bool,
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(parsed))
}

/// `/health` sits outside the rate limiter so probes are never throttled.
pub fn build_router(state: AppState, settings: RouterSettings) -> Router {
    let metrics_routes = Router::new()
        .route("/metrics", get(ops::metrics))
        .layer(from_fn_with_state(settings.metrics_api_key.clone(), require_metrics_key));

    let limited = Router::new()
        .route("/webhook/razorpay", post(webhooks::razorpay_webhook))
        .route("/webhook/cashfree", post(webhooks::cashfree_webhook))
        .route("/create-order", post(payments::create_order))
        .route("/verify-payment", post(payments::verify_payment))
        .route("/payment/order/:order_id", get(payments::get_payment_by_order))
        .route("/payment/:id", get(payments::get_payment))
        .route("/refund", post(payments::refund))
        .merge(metrics_routes)
        .layer(from_fn_with_state(settings.rate_limit.clone(), rate_limit::enforce));

    let mut app = Router::new().route("/health", get(ops::health)).merge(limited);

    if settings.expose_error_details {
        app = app.layer(from_fn(attach_error_details));
    }

    app.layer(from_fn_with_state(state.metrics.clone(), request_metrics::track))
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(cors_layer(&settings.cors_origins))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
