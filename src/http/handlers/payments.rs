use crate::domain::payment::{
    CreateOrderRequest, PaymentRecord, PaymentSummary, RefundRequest, RefundSummary, VerifyPaymentRequest,
};
use crate::error::ApiError;
use crate::http::extract::Json;
use crate::service::payment_service::CreateOrderResponse;
use crate::AppState;
use axum::extract::{Path, State};

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>, ApiError> {
    Ok(Json(state.payment_service.create_order(req).await?))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<Json<PaymentSummary>, ApiError> {
    Ok(Json(state.payment_service.verify_payment(req).await?))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
) -> Result<Json<PaymentSummary>, ApiError> {
    Ok(Json(state.payment_service.get_payment(&payment_id).await?))
}

pub async fn get_payment_by_order(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<PaymentRecord>, ApiError> {
    Ok(Json(state.payment_service.get_record(&order_id).await?))
}

pub async fn refund(
    State(state): State<AppState>,
    Json(req): Json<RefundRequest>,
) -> Result<Json<RefundSummary>, ApiError> {
    Ok(Json(state.refund_service.refund(req).await?))
}
