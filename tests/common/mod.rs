#![allow(dead_code)]

use anyhow::{bail, Result};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use hmac::{Hmac, Mac};
use payments_backend::gateways::mock::{MockBehavior, MockGateway};
use payments_backend::gateways::GatewayPayment;
use payments_backend::http::middleware::rate_limit::RateLimitState;
use payments_backend::http::router::{build_router, RouterSettings};
use payments_backend::metrics::service_metrics::{HealthThresholds, ServiceMetrics};
use payments_backend::notifier::{EmailMessage, Notifier};
use payments_backend::repo::memory_repo::MemoryPaymentStore;
use payments_backend::webhooks::WebhookSecrets;
use payments_backend::AppState;
use serde_json::Value;
use sha2::Sha256;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const RAZORPAY_WEBHOOK_SECRET: &str = "rzp_whsec_test";
pub const CASHFREE_WEBHOOK_SECRET: &str = "cf_whsec_test";
pub const KEY_SECRET: &str = "rzp_key_secret_test";
pub const METRICS_KEY: &str = "metrics-key-test";

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message);
        if self.fail {
            bail!("smtp relay down");
        }
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryPaymentStore>,
    pub gateway: Arc<MockGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn app() -> TestApp {
    app_with(MockBehavior::AlwaysSuccess, RecordingNotifier::default())
}

pub fn app_with(behavior: MockBehavior, notifier: RecordingNotifier) -> TestApp {
    let store = Arc::new(MemoryPaymentStore::new());
    let gateway = Arc::new(MockGateway::new(KEY_SECRET, behavior));
    let notifier = Arc::new(notifier);

    let state = AppState::new(
        store.clone(),
        gateway.clone(),
        notifier.clone(),
        "rzp_test_key".to_string(),
        WebhookSecrets {
            razorpay: Some(RAZORPAY_WEBHOOK_SECRET.to_string()),
            cashfree: Some(CASHFREE_WEBHOOK_SECRET.to_string()),
        },
        Arc::new(ServiceMetrics::new()),
        HealthThresholds::default(),
    );

    let router = build_router(
        state.clone(),
        RouterSettings {
            cors_origins: vec!["*".to_string()],
            max_body_bytes: 64 * 1024,
            rate_limit: RateLimitState {
                redis_client: None,
                window_secs: 900,
                max_requests: 100,
            },
            metrics_api_key: Some(METRICS_KEY.to_string()),
            expose_error_details: true,
        },
    );

    TestApp {
        router,
        state,
        store,
        gateway,
        notifier,
    }
}

pub fn captured_payment(id: &str, order_id: &str, amount: i64) -> GatewayPayment {
    GatewayPayment {
        id: id.to_string(),
        amount,
        currency: "INR".to_string(),
        status: "captured".to_string(),
        order_id: Some(order_id.to_string()),
        method: Some("upi".to_string()),
        email: Some("a@b.com".to_string()),
        amount_refunded: 0,
        refund_status: None,
        notes: serde_json::json!({}),
    }
}

/// Reference HMAC, independent of the crate's signature module.
pub fn hmac_sha256(secret: &str, parts: &[&[u8]]) -> Vec<u8> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().to_vec()
}

pub fn razorpay_signature(secret: &str, body: &[u8]) -> String {
    hex::encode(hmac_sha256(secret, &[body]))
}

pub fn cashfree_signature(secret: &str, timestamp: &str, body: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(hmac_sha256(secret, &[timestamp.as_bytes(), body]))
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn razorpay_webhook(body: &str, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook/razorpay")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("x-razorpay-signature", sig);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn cashfree_webhook(body: &str, timestamp: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/cashfree")
        .header("content-type", "application/json")
        .header("x-webhook-timestamp", timestamp)
        .header("x-webhook-signature", signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn payment_captured_body(order_id: &str, payment_id: &str, amount: i64, email: &str) -> String {
    serde_json::json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "order_id": order_id,
                    "amount": amount,
                    "currency": "INR",
                    "status": "captured",
                    "method": "card",
                    "email": email,
                    "notes": { "user_id": "user_1" }
                }
            }
        }
    })
    .to_string()
}
