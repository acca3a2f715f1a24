use crate::domain::payment::{Gateway, PaymentStatus, PaymentUpdate, RefundRequest, RefundSummary};
use crate::error::ApiError;
use crate::gateways::{GatewayRefundRequest, PaymentGateway};
use crate::repo::payments_repo::PaymentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct RefundService {
    pub store: Arc<dyn PaymentStore>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl RefundService {
    /// Each step is a separate call with no rollback: the record's status marks
    /// how far the sequence got. A partial refund returns the row to SUCCESS.
    pub async fn refund(&self, req: RefundRequest) -> Result<RefundSummary, ApiError> {
        let payment_id = req.payment_id.trim().to_string();
        if payment_id.is_empty() {
            return Err(ApiError::bad_request("MISSING_PAYMENT_ID", "payment_id is required"));
        }
        if req.amount.is_some_and(|a| a <= 0) {
            return Err(ApiError::bad_request("INVALID_AMOUNT", "amount must be > 0"));
        }

        let payment = self.gateway.fetch_payment(&payment_id).await?;
        if PaymentStatus::normalize(&payment.status) != PaymentStatus::Success {
            return Err(ApiError::bad_request(
                "PAYMENT_NOT_CAPTURED",
                format!("payment is {}, only captured payments can be refunded", payment.status),
            ));
        }

        let mut record = self.store.find_by_payment_id(&payment_id).await?;
        if record.is_none() {
            if let Some(order_id) = &payment.order_id {
                record = self.store.find_by_order_id(order_id).await?;
            }
        }

        if let Some(existing) = &record {
            match existing.status {
                PaymentStatus::Refunded => {
                    return Err(ApiError::conflict("ALREADY_REFUNDED", "payment already refunded"))
                }
                PaymentStatus::RefundPending => {
                    return Err(ApiError::conflict("REFUND_IN_PROGRESS", "refund in progress"))
                }
                status if !status.accepts(PaymentStatus::RefundPending) => {
                    return Err(ApiError::conflict(
                        "PAYMENT_NOT_REFUNDABLE",
                        format!("payment is {}", status.as_str()),
                    ))
                }
                _ => {}
            }
        }

        let refundable = payment.amount - payment.amount_refunded;
        let amount = req.amount.unwrap_or(refundable);
        if amount > refundable || refundable <= 0 {
            return Err(ApiError::bad_request(
                "REFUND_EXCEEDS_CAPTURED",
                format!("refund amount {} exceeds refundable amount {}", amount, refundable.max(0)),
            ));
        }

        let order_id = match (&record, &payment.order_id) {
            (Some(r), _) => r.order_id.clone(),
            (None, Some(o)) => o.clone(),
            (None, None) => {
                return Err(ApiError::bad_request(
                    "ORDER_NOT_FOUND",
                    "payment is not linked to an order",
                ))
            }
        };

        if record.is_none() {
            self.store
                .upsert(
                    &order_id,
                    &PaymentUpdate {
                        payment_id: Some(payment.id.clone()),
                        gateway: Some(Gateway::Razorpay),
                        amount: Some(payment.amount),
                        currency: Some(payment.currency.clone()),
                        status: Some(PaymentStatus::Success),
                        payment_method: payment.method.clone(),
                        customer_email: payment.email.clone(),
                        ..Default::default()
                    },
                )
                .await?;
        }

        if !self.store.try_mark_refund_pending(&order_id).await? {
            return Err(ApiError::conflict("REFUND_IN_PROGRESS", "refund in progress"));
        }

        let gateway_req = GatewayRefundRequest {
            amount,
            notes: req.notes.clone(),
        };
        let refund = match self.gateway.refund(&payment_id, &gateway_req).await {
            Ok(refund) => refund,
            Err(e) => {
                tracing::warn!(%order_id, %payment_id, error = %e, "gateway refund failed");
                let failed = PaymentUpdate {
                    status: Some(PaymentStatus::RefundFailed),
                    error_message: Some(e.vendor_message()),
                    ..Default::default()
                };
                if let Err(store_err) = self.store.upsert(&order_id, &failed).await {
                    tracing::error!(%order_id, error = %store_err, "could not mark refund failed");
                }
                return Err(e.into());
            }
        };

        let total_refunded = payment.amount_refunded + refund.amount;
        let status = if total_refunded >= payment.amount {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::Success
        };
        let done = PaymentUpdate {
            status: Some(status),
            refund_id: Some(refund.id.clone()),
            refund_amount: Some(total_refunded),
            refund_status: Some(refund.status.clone()),
            ..Default::default()
        };
        if let Err(e) = self.store.upsert(&order_id, &done).await {
            // funds already moved at the gateway, reconcile by hand
            tracing::error!(
                %order_id,
                %payment_id,
                refund_id = %refund.id,
                error = %e,
                "refund executed but local record not updated"
            );
        }

        tracing::info!(
            %order_id,
            %payment_id,
            refund_id = %refund.id,
            amount = refund.amount,
            total_refunded,
            status = status.as_str(),
            "refund issued"
        );

        Ok(RefundSummary {
            refund_id: refund.id,
            payment_id,
            order_id,
            amount: refund.amount,
            currency: refund.currency,
            refund_status: refund.status,
            status,
        })
    }
}
