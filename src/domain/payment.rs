use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    Razorpay,
    Cashfree,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::Razorpay => "razorpay",
            Gateway::Cashfree => "cashfree",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    RefundPending,
    Refunded,
    RefundFailed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::RefundPending => "REFUND_PENDING",
            PaymentStatus::Refunded => "REFUNDED",
            PaymentStatus::RefundFailed => "REFUND_FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Maps a free-text payment status (vendor or stored) onto the internal enum.
    /// Unknown values fall back to `Pending` so new vendor statuses are never dropped.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "captured" | "success" | "paid" | "completed" | "settled" => PaymentStatus::Success,
            "failed" | "failure" | "user_dropped" | "declined" | "expired" => PaymentStatus::Failed,
            "cancelled" | "canceled" | "void" | "terminated" => PaymentStatus::Cancelled,
            "refund_pending" => PaymentStatus::RefundPending,
            "refunded" => PaymentStatus::Refunded,
            "refund_failed" => PaymentStatus::RefundFailed,
            _ => PaymentStatus::Pending,
        }
    }

    /// Maps a vendor refund status. Unknown values are treated as still in flight.
    pub fn from_refund_status(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processed" | "success" | "refunded" => PaymentStatus::Refunded,
            "failed" | "failure" | "cancelled" | "canceled" => PaymentStatus::RefundFailed,
            _ => PaymentStatus::RefundPending,
        }
    }

    /// Whether a record currently in `self` may move to `next`. Guards against
    /// webhooks delivered out of order overwriting a later state.
    pub fn accepts(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        if *self == next {
            return true;
        }
        match self {
            Pending | Failed => true,
            Success => !matches!(next, Pending | Failed),
            RefundPending => matches!(next, Refunded | RefundFailed),
            RefundFailed => matches!(next, RefundPending | Refunded),
            Refunded | Cancelled => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub order_id: String,
    pub payment_id: Option<String>,
    pub user_id: Option<String>,
    pub gateway: String,
    pub amount: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub customer_email: Option<String>,
    pub refund_id: Option<String>,
    pub refund_amount: Option<i64>,
    pub refund_status: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Field changes applied by `PaymentStore::upsert`. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub payment_id: Option<String>,
    pub user_id: Option<String>,
    pub gateway: Option<Gateway>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub payment_method: Option<String>,
    pub customer_email: Option<String>,
    pub refund_id: Option<String>,
    pub refund_amount: Option<i64>,
    pub refund_status: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    pub amount: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub receipt: Option<String>,
    pub notes: Option<serde_json::Value>,
    pub user_id: Option<String>,
}

fn default_currency() -> String {
    "INR".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundRequest {
    #[serde(default)]
    pub payment_id: String,
    pub amount: Option<i64>,
    pub notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    pub order_id: Option<String>,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub gateway_status: String,
    pub amount: i64,
    pub currency: String,
    pub method: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefundSummary {
    pub refund_id: String,
    pub payment_id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub refund_status: String,
    pub status: PaymentStatus,
}
