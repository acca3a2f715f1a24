use crate::metrics::service_metrics::ServiceMetrics;
use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

pub async fn track(
    State(metrics): State<Arc<ServiceMetrics>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    metrics.record_request();
    let response = next.run(request).await;
    metrics.record_response(response.status().as_u16());
    response
}
