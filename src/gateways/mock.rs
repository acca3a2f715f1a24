use crate::gateways::{
    GatewayError, GatewayOrder, GatewayOrderRequest, GatewayPayment, GatewayRefund,
    GatewayRefundRequest, PaymentGateway,
};
use crate::webhooks::signature::{self, SignatureScheme};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    AlwaysSuccess,
    AlwaysFailure,
    AlwaysTimeout,
}

/// In-process gateway used for local runs and tests. Payments are seeded with
/// `insert_payment`; refunds move the seeded payment's `amount_refunded`.
pub struct MockGateway {
    pub key_secret: String,
    pub behavior: MockBehavior,
    payments: Mutex<HashMap<String, GatewayPayment>>,
    order_calls: AtomicUsize,
    refund_calls: AtomicUsize,
}

impl MockGateway {
    pub fn new(key_secret: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            key_secret: key_secret.into(),
            behavior,
            payments: Mutex::new(HashMap::new()),
            order_calls: AtomicUsize::new(0),
            refund_calls: AtomicUsize::new(0),
        }
    }

    pub fn insert_payment(&self, payment: GatewayPayment) {
        if let Ok(mut payments) = self.payments.lock() {
            payments.insert(payment.id.clone(), payment);
        }
    }

    pub fn order_calls(&self) -> usize {
        self.order_calls.load(Ordering::SeqCst)
    }

    pub fn refund_calls(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }

    fn failure(&self) -> Option<GatewayError> {
        match self.behavior {
            MockBehavior::AlwaysSuccess => None,
            MockBehavior::AlwaysFailure => Some(GatewayError::Api {
                status: 400,
                code: Some("MOCK_DECLINED".to_string()),
                description: "mock decline".to_string(),
            }),
            MockBehavior::AlwaysTimeout => Some(GatewayError::Timeout),
        }
    }
}

#[async_trait::async_trait]
impl PaymentGateway for MockGateway {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        self.order_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.failure() {
            return Err(e);
        }

        Ok(GatewayOrder {
            id: format!("order_mock_{}", uuid::Uuid::new_v4().simple()),
            entity: Some("order".to_string()),
            amount: request.amount,
            amount_paid: 0,
            amount_due: request.amount,
            currency: request.currency.clone(),
            receipt: Some(request.receipt.clone()),
            status: "created".to_string(),
            attempts: 0,
            notes: request.notes.clone().unwrap_or_default(),
            created_at: chrono::Utc::now().timestamp(),
        })
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let payments = self
            .payments
            .lock()
            .map_err(|_| GatewayError::Transport("mock state poisoned".to_string()))?;
        payments.get(payment_id).cloned().ok_or_else(|| GatewayError::Api {
            status: 400,
            code: Some("BAD_REQUEST_ERROR".to_string()),
            description: "The id provided does not exist".to_string(),
        })
    }

    async fn refund(
        &self,
        payment_id: &str,
        request: &GatewayRefundRequest,
    ) -> Result<GatewayRefund, GatewayError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.failure() {
            return Err(e);
        }

        let mut payments = self
            .payments
            .lock()
            .map_err(|_| GatewayError::Transport("mock state poisoned".to_string()))?;
        let payment = payments.get_mut(payment_id).ok_or_else(|| GatewayError::Api {
            status: 400,
            code: Some("BAD_REQUEST_ERROR".to_string()),
            description: "The id provided does not exist".to_string(),
        })?;
        payment.amount_refunded += request.amount;

        Ok(GatewayRefund {
            id: format!("rfnd_mock_{}", uuid::Uuid::new_v4().simple()),
            payment_id: payment_id.to_string(),
            amount: request.amount,
            currency: payment.currency.clone(),
            status: "processed".to_string(),
        })
    }

    fn verify_checkout_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let message = format!("{}|{}", order_id, payment_id);
        signature::verify(
            Some(&self.key_secret),
            None,
            message.as_bytes(),
            Some(signature),
            SignatureScheme::RAZORPAY,
        )
        .is_ok()
    }
}
