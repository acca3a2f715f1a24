use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod mock;
pub mod razorpay;

#[derive(Debug, Clone, Serialize)]
pub struct GatewayOrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    #[serde(default)]
    pub entity: Option<String>,
    pub amount: i64,
    #[serde(default)]
    pub amount_paid: i64,
    #[serde(default)]
    pub amount_due: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub attempts: i64,
    #[serde(default)]
    pub notes: serde_json::Value,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub refund_status: Option<String>,
    #[serde(default)]
    pub notes: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayRefundRequest {
    pub amount: i64,
    pub notes: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayRefund {
    pub id: String,
    pub payment_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway responded {status}: {description}")]
    Api {
        status: u16,
        code: Option<String>,
        description: String,
    },

    #[error("gateway request timed out")]
    Timeout,

    #[error("gateway transport error: {0}")]
    Transport(String),

    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Message safe to show the caller: the vendor's own description where there is one.
    pub fn vendor_message(&self) -> String {
        match self {
            GatewayError::Api { description, .. } => description.clone(),
            GatewayError::Timeout => "payment gateway timed out".to_string(),
            GatewayError::Transport(_) | GatewayError::Decode(_) => {
                "payment gateway unavailable".to_string()
            }
        }
    }
}

#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;

    async fn refund(
        &self,
        payment_id: &str,
        request: &GatewayRefundRequest,
    ) -> Result<GatewayRefund, GatewayError>;

    /// Checks the signature the checkout widget returns after a successful payment.
    fn verify_checkout_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}
