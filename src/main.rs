use payments_backend::config::AppConfig;
use payments_backend::gateways::razorpay::RazorpayGateway;
use payments_backend::http::middleware::rate_limit::RateLimitState;
use payments_backend::http::router::{build_router, RouterSettings};
use payments_backend::metrics::service_metrics::ServiceMetrics;
use payments_backend::notifier::{LogNotifier, Notifier, ResendNotifier};
use payments_backend::repo::payments_repo::PaymentsRepo;
use payments_backend::webhooks::WebhookSecrets;
use payments_backend::AppState;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("payments_backend=info,tower_http=info")),
        )
        .init();

    let cfg = AppConfig::from_env()?;
    tracing::info!(config = ?cfg, "configuration loaded");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cfg.gateway_timeout_ms))
        .build()?;

    let gateway = Arc::new(RazorpayGateway {
        base_url: cfg.razorpay_base_url.clone(),
        key_id: cfg.razorpay_key_id.clone(),
        key_secret: cfg.razorpay_key_secret.clone(),
        timeout_ms: cfg.gateway_timeout_ms,
        client: http_client.clone(),
    });

    let notifier: Arc<dyn Notifier> = match &cfg.resend_api_key {
        Some(key) => Arc::new(ResendNotifier::new(key.clone(), cfg.email_from.clone(), http_client)),
        None => {
            tracing::warn!("RESEND_API_KEY not set, confirmation emails disabled");
            Arc::new(LogNotifier)
        }
    };

    if cfg.razorpay_webhook_secret.is_none() {
        tracing::warn!("RAZORPAY_WEBHOOK_SECRET not set, razorpay webhooks will be rejected");
    }
    if cfg.cashfree_webhook_secret.is_none() {
        tracing::warn!("CASHFREE_WEBHOOK_SECRET not set, cashfree webhooks will be rejected");
    }

    let redis_client = match redis::Client::open(cfg.redis_url.clone()) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::warn!(error = %e, "invalid REDIS_URL, rate limiting disabled");
            None
        }
    };

    let metrics = Arc::new(ServiceMetrics::new());
    let state = AppState::new(
        Arc::new(PaymentsRepo { pool }),
        gateway,
        notifier,
        cfg.razorpay_key_id.clone(),
        WebhookSecrets {
            razorpay: cfg.razorpay_webhook_secret.clone(),
            cashfree: cfg.cashfree_webhook_secret.clone(),
        },
        metrics,
        cfg.health,
    );

    let app = build_router(
        state,
        RouterSettings {
            cors_origins: cfg.cors_origins.clone(),
            max_body_bytes: cfg.max_body_bytes,
            rate_limit: RateLimitState {
                redis_client,
                window_secs: cfg.rate_limit_window_secs,
                max_requests: cfg.rate_limit_max,
            },
            metrics_api_key: cfg.metrics_api_key.clone(),
            expose_error_details: !cfg.is_production(),
        },
    );

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
