use crate::domain::payment::{PaymentRecord, PaymentStatus, PaymentUpdate};
use crate::domain::webhook::{NormalizedPayment, NormalizedRefund, WebhookEvent};
use crate::notifier::{self, EmailMessage, Notifier};
use crate::repo::payments_repo::PaymentStore;
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Applied { order_id: String, status: PaymentStatus },
    Stale { order_id: String, current: PaymentStatus, incoming: PaymentStatus },
    Unmatched,
    Ignored,
}

/// A processed refund that leaves part of the captured amount keeps the row at
/// SUCCESS; `refund_amount` is the running total.
fn settle_refund(current: &PaymentRecord, r: &NormalizedRefund) -> (PaymentStatus, Option<i64>) {
    match (r.status, r.amount) {
        (PaymentStatus::Refunded, Some(amount)) if current.amount > 0 => {
            let already = current.refund_amount.unwrap_or(0);
            // the refund endpoint may have counted this refund already
            let total = if r.refund_id.is_some() && r.refund_id == current.refund_id {
                already.max(amount)
            } else {
                already + amount
            };
            if total >= current.amount {
                (PaymentStatus::Refunded, Some(total.min(current.amount)))
            } else {
                (PaymentStatus::Success, Some(total))
            }
        }
        _ => (r.status, r.amount),
    }
}

#[derive(Clone)]
pub struct WebhookService {
    pub store: Arc<dyn PaymentStore>,
    pub notifier: Arc<dyn Notifier>,
}

impl WebhookService {
    pub async fn apply(&self, event: WebhookEvent) -> Result<WebhookOutcome> {
        tracing::debug!(event_type = event.event_type(), "applying webhook");
        match event {
            WebhookEvent::Payment(payment) => self.apply_payment(payment).await,
            WebhookEvent::Refund(refund) => self.apply_refund(refund).await,
            WebhookEvent::Unrecognized { gateway, event_type } => {
                tracing::info!(gateway = gateway.as_str(), %event_type, "unhandled webhook event acknowledged");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }

    async fn apply_payment(&self, p: NormalizedPayment) -> Result<WebhookOutcome> {
        let current = self.store.find_by_order_id(&p.order_id).await?;
        if let Some(cur) = &current {
            if !cur.status.accepts(p.status) {
                tracing::warn!(
                    order_id = %p.order_id,
                    event_type = %p.event_type,
                    current = cur.status.as_str(),
                    incoming = p.status.as_str(),
                    "stale webhook ignored"
                );
                return Ok(WebhookOutcome::Stale {
                    order_id: p.order_id,
                    current: cur.status,
                    incoming: p.status,
                });
            }
        }

        let update = PaymentUpdate {
            payment_id: p.payment_id.clone(),
            user_id: p.user_id.clone(),
            gateway: Some(p.gateway),
            amount: p.amount,
            currency: p.currency.clone(),
            status: Some(p.status),
            payment_method: p.method.clone(),
            customer_email: p.email.clone(),
            error_message: if p.status == PaymentStatus::Failed {
                p.error_message.clone()
            } else {
                None
            },
            metadata: Some(p.raw.clone()),
            ..Default::default()
        };
        let record = self.store.upsert(&p.order_id, &update).await?;

        tracing::info!(
            gateway = p.gateway.as_str(),
            event_type = %p.event_type,
            order_id = %record.order_id,
            status = record.status.as_str(),
            "payment webhook applied"
        );

        let newly_captured = p.status == PaymentStatus::Success
            && current.as_ref().map(|c| c.status) != Some(PaymentStatus::Success);
        if newly_captured {
            if let Some(to) = record.customer_email.as_deref() {
                let message = notifier::payment_confirmation(
                    to,
                    &record.order_id,
                    record.payment_id.as_deref(),
                    record.amount,
                    &record.currency,
                );
                self.notify(message).await;
            }
        }

        Ok(WebhookOutcome::Applied {
            order_id: record.order_id,
            status: record.status,
        })
    }

    async fn apply_refund(&self, r: NormalizedRefund) -> Result<WebhookOutcome> {
        let Some(current) = self.locate(&r).await? else {
            tracing::warn!(
                gateway = r.gateway.as_str(),
                payment_id = ?r.payment_id,
                order_id = ?r.order_id,
                "refund webhook for unknown payment"
            );
            return Ok(WebhookOutcome::Unmatched);
        };

        if !current.status.accepts(r.status) {
            tracing::warn!(
                order_id = %current.order_id,
                event_type = %r.event_type,
                current = current.status.as_str(),
                incoming = r.status.as_str(),
                "stale refund webhook ignored"
            );
            return Ok(WebhookOutcome::Stale {
                order_id: current.order_id,
                current: current.status,
                incoming: r.status,
            });
        }

        let (status, refund_amount) = settle_refund(&current, &r);
        let update = PaymentUpdate {
            status: Some(status),
            refund_id: r.refund_id.clone(),
            refund_amount,
            refund_status: Some(r.vendor_status.clone()),
            customer_email: r.email.clone(),
            error_message: if r.status == PaymentStatus::RefundFailed {
                Some(format!("refund {}", r.vendor_status.to_ascii_lowercase()))
            } else {
                None
            },
            metadata: Some(r.raw.clone()),
            ..Default::default()
        };
        let record = self.store.upsert(&current.order_id, &update).await?;

        tracing::info!(
            gateway = r.gateway.as_str(),
            event_type = %r.event_type,
            order_id = %record.order_id,
            status = record.status.as_str(),
            "refund webhook applied"
        );

        if status == PaymentStatus::Refunded && current.status != PaymentStatus::Refunded {
            if let Some(to) = record.customer_email.as_deref() {
                let message = notifier::refund_confirmation(
                    to,
                    &record.order_id,
                    record.refund_id.as_deref(),
                    record.refund_amount.unwrap_or(record.amount),
                    r.currency.as_deref().unwrap_or(&record.currency),
                );
                self.notify(message).await;
            }
        }

        Ok(WebhookOutcome::Applied {
            order_id: record.order_id,
            status: record.status,
        })
    }

    async fn locate(&self, r: &NormalizedRefund) -> Result<Option<PaymentRecord>> {
        if let Some(payment_id) = &r.payment_id {
            if let Some(found) = self.store.find_by_payment_id(payment_id).await? {
                return Ok(Some(found));
            }
        }
        match &r.order_id {
            Some(order_id) => self.store.find_by_order_id(order_id).await,
            None => Ok(None),
        }
    }

    async fn notify(&self, message: EmailMessage) {
        let to = message.to.clone();
        if let Err(e) = self.notifier.send(message).await {
            tracing::error!(%to, error = %e, "confirmation email failed");
        }
    }
}
