use crate::domain::payment::{
    CreateOrderRequest, Gateway, PaymentRecord, PaymentStatus, PaymentSummary, PaymentUpdate,
    VerifyPaymentRequest,
};
use crate::error::ApiError;
use crate::gateways::{GatewayOrderRequest, GatewayPayment, PaymentGateway};
use crate::repo::payments_repo::PaymentStore;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub status: String,
    /// Public key the checkout widget is opened with.
    pub key_id: String,
}

#[derive(Clone)]
pub struct PaymentService {
    pub store: Arc<dyn PaymentStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub key_id: String,
}

impl PaymentService {
    pub async fn create_order(&self, req: CreateOrderRequest) -> Result<CreateOrderResponse, ApiError> {
        validate_order(&req)?;

        let receipt = req
            .receipt
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| format!("rcpt_{}", uuid::Uuid::new_v4().simple()));
        let currency = req.currency.to_ascii_uppercase();

        let order = self
            .gateway
            .create_order(&GatewayOrderRequest {
                amount: req.amount,
                currency: currency.clone(),
                receipt: receipt.clone(),
                notes: req.notes.clone(),
            })
            .await?;

        self.store
            .upsert(
                &order.id,
                &PaymentUpdate {
                    user_id: req.user_id.clone(),
                    gateway: Some(Gateway::Razorpay),
                    amount: Some(order.amount),
                    currency: Some(order.currency.clone()),
                    status: Some(PaymentStatus::Pending),
                    metadata: req.notes.clone(),
                    ..Default::default()
                },
            )
            .await?;

        tracing::info!(
            order_id = %order.id,
            gateway = self.gateway.name(),
            amount = order.amount,
            "order created"
        );

        Ok(CreateOrderResponse {
            order_id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or(receipt),
            status: order.status,
            key_id: self.key_id.clone(),
        })
    }

    /// Confirms a checkout callback and reconciles the local record with the
    /// gateway's view of the payment.
    pub async fn verify_payment(&self, req: VerifyPaymentRequest) -> Result<PaymentSummary, ApiError> {
        if req.razorpay_order_id.is_empty()
            || req.razorpay_payment_id.is_empty()
            || req.razorpay_signature.is_empty()
        {
            return Err(ApiError::bad_request(
                "MISSING_FIELDS",
                "razorpay_order_id, razorpay_payment_id and razorpay_signature are required",
            ));
        }

        if !self.gateway.verify_checkout_signature(
            &req.razorpay_order_id,
            &req.razorpay_payment_id,
            &req.razorpay_signature,
        ) {
            tracing::warn!(order_id = %req.razorpay_order_id, "checkout signature mismatch");
            return Err(ApiError::bad_request("INVALID_SIGNATURE", "invalid payment signature"));
        }

        let payment = self.gateway.fetch_payment(&req.razorpay_payment_id).await?;
        if let Some(linked) = &payment.order_id {
            if linked != &req.razorpay_order_id {
                return Err(ApiError::bad_request(
                    "ORDER_MISMATCH",
                    "payment does not belong to the given order",
                ));
            }
        }

        let incoming = PaymentStatus::normalize(&payment.status);
        let current = self.store.find_by_order_id(&req.razorpay_order_id).await?;
        let status = match &current {
            Some(cur) if !cur.status.accepts(incoming) => {
                tracing::info!(
                    order_id = %req.razorpay_order_id,
                    current = cur.status.as_str(),
                    incoming = incoming.as_str(),
                    "record already ahead of gateway status"
                );
                cur.status
            }
            _ => {
                let record = self
                    .store
                    .upsert(
                        &req.razorpay_order_id,
                        &PaymentUpdate {
                            payment_id: Some(payment.id.clone()),
                            gateway: Some(Gateway::Razorpay),
                            amount: Some(payment.amount),
                            currency: Some(payment.currency.clone()),
                            status: Some(incoming),
                            payment_method: payment.method.clone(),
                            customer_email: payment.email.clone(),
                            ..Default::default()
                        },
                    )
                    .await?;
                record.status
            }
        };

        tracing::info!(
            order_id = %req.razorpay_order_id,
            payment_id = %payment.id,
            status = status.as_str(),
            "checkout payment verified"
        );

        Ok(summarize(payment, status))
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<PaymentSummary, ApiError> {
        let payment = self.gateway.fetch_payment(payment_id).await?;
        let status = PaymentStatus::normalize(&payment.status);
        Ok(summarize(payment, status))
    }

    pub async fn get_record(&self, order_id: &str) -> Result<PaymentRecord, ApiError> {
        self.store
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no payment for order {}", order_id)))
    }
}

fn summarize(payment: GatewayPayment, status: PaymentStatus) -> PaymentSummary {
    PaymentSummary {
        order_id: payment.order_id,
        payment_id: payment.id,
        status,
        gateway_status: payment.status,
        amount: payment.amount,
        currency: payment.currency,
        method: payment.method,
        email: payment.email,
    }
}

fn validate_order(req: &CreateOrderRequest) -> Result<(), ApiError> {
    if req.amount <= 0 {
        return Err(ApiError::bad_request("INVALID_AMOUNT", "amount must be > 0"));
    }
    if req.currency.len() != 3 || !req.currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ApiError::bad_request(
            "INVALID_CURRENCY",
            "currency must be a 3-letter ISO code",
        ));
    }
    Ok(())
}
