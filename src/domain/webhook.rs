use crate::domain::payment::{Gateway, PaymentStatus};

#[derive(Debug, Clone)]
pub struct NormalizedPayment {
    pub gateway: Gateway,
    pub event_type: String,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub error_message: Option<String>,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct NormalizedRefund {
    pub gateway: Gateway,
    pub event_type: String,
    pub refund_id: Option<String>,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub vendor_status: String,
    pub status: PaymentStatus,
    pub email: Option<String>,
    pub raw: serde_json::Value,
}

/// A verified gateway callback, one variant per kind of state change.
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Payment(NormalizedPayment),
    Refund(NormalizedRefund),
    Unrecognized { gateway: Gateway, event_type: String },
}

impl WebhookEvent {
    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::Payment(p) => &p.event_type,
            WebhookEvent::Refund(r) => &r.event_type,
            WebhookEvent::Unrecognized { event_type, .. } => event_type,
        }
    }
}
