pub mod config;
pub mod domain {
    pub mod payment;
    pub mod webhook;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod extract;
    pub mod handlers {
        pub mod ops;
        pub mod payments;
        pub mod webhooks;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod error_details;
        pub mod rate_limit;
        pub mod request_metrics;
    }
    pub mod router;
}
pub mod metrics {
    pub mod service_metrics;
}
pub mod notifier;
pub mod repo {
    pub mod memory_repo;
    pub mod payments_repo;
}
pub mod service {
    pub mod payment_service;
    pub mod refund_service;
    pub mod webhook_service;
}
pub mod webhooks;

use gateways::PaymentGateway;
use metrics::service_metrics::{HealthThresholds, ServiceMetrics};
use notifier::Notifier;
use repo::payments_repo::PaymentStore;
use std::sync::Arc;
use webhooks::WebhookSecrets;

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub refund_service: service::refund_service::RefundService,
    pub webhook_service: service::webhook_service::WebhookService,
    pub webhook_secrets: WebhookSecrets,
    pub metrics: Arc<ServiceMetrics>,
    pub health_thresholds: HealthThresholds,
}

impl AppState {
    pub fn new(
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        key_id: String,
        webhook_secrets: WebhookSecrets,
        metrics: Arc<ServiceMetrics>,
        health_thresholds: HealthThresholds,
    ) -> Self {
        Self {
            payment_service: service::payment_service::PaymentService {
                store: store.clone(),
                gateway: gateway.clone(),
                key_id,
            },
            refund_service: service::refund_service::RefundService {
                store: store.clone(),
                gateway,
            },
            webhook_service: service::webhook_service::WebhookService { store, notifier },
            webhook_secrets,
            metrics,
            health_thresholds,
        }
    }
}
