use crate::metrics::service_metrics::HealthThresholds;
use anyhow::{anyhow, Context, Result};
use std::str::FromStr;

#[derive(Clone)]
pub struct AppConfig {
    pub environment: String,
    pub bind_addr: String,
    pub database_url: String,
    pub redis_url: String,
    pub razorpay_key_id: String,
    pub razorpay_key_secret: String,
    pub razorpay_base_url: String,
    pub gateway_timeout_ms: u64,
    pub razorpay_webhook_secret: Option<String>,
    pub cashfree_webhook_secret: Option<String>,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub cors_origins: Vec<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max: i64,
    pub max_body_bytes: usize,
    pub metrics_api_key: Option<String>,
    pub health: HealthThresholds,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("bind_addr", &self.bind_addr)
            .field("razorpay_key_id", &self.razorpay_key_id)
            .field("razorpay_base_url", &self.razorpay_base_url)
            .field("gateway_timeout_ms", &self.gateway_timeout_ms)
            .field("razorpay_webhook_secret", &self.razorpay_webhook_secret.is_some())
            .field("cashfree_webhook_secret", &self.cashfree_webhook_secret.is_some())
            .field("email_enabled", &self.resend_api_key.is_some())
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| get(key).ok_or_else(|| anyhow!("missing required env var {}", key));

        let defaults = HealthThresholds::default();

        Ok(Self {
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: required("DATABASE_URL")?,
            redis_url: get("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379/".to_string()),
            razorpay_key_id: required("RAZORPAY_KEY_ID")?,
            razorpay_key_secret: required("RAZORPAY_KEY_SECRET")?,
            razorpay_base_url: get("RAZORPAY_BASE_URL")
                .unwrap_or_else(|| "https://api.razorpay.com".to_string()),
            gateway_timeout_ms: parse_or(&get, "GATEWAY_TIMEOUT_MS", 10_000)?,
            razorpay_webhook_secret: get("RAZORPAY_WEBHOOK_SECRET"),
            cashfree_webhook_secret: get("CASHFREE_WEBHOOK_SECRET").or_else(|| get("CASHFREE_SECRET_KEY")),
            resend_api_key: get("RESEND_API_KEY"),
            email_from: get("EMAIL_FROM").unwrap_or_else(|| "payments@example.com".to_string()),
            cors_origins: get("CORS_ORIGIN")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rate_limit_window_secs: parse_or(&get, "RATE_LIMIT_WINDOW_SECS", 900)?,
            rate_limit_max: parse_or(&get, "RATE_LIMIT_MAX", 100)?,
            max_body_bytes: parse_or(&get, "MAX_BODY_BYTES", 1_048_576)?,
            metrics_api_key: get("METRICS_API_KEY"),
            health: HealthThresholds {
                max_memory_mb: parse_or(&get, "HEALTH_MAX_MEMORY_MB", defaults.max_memory_mb)?,
                max_cpu_percent: parse_or(&get, "HEALTH_MAX_CPU_PERCENT", defaults.max_cpu_percent)?,
                max_error_rate: parse_or(&get, "HEALTH_MAX_ERROR_RATE", defaults.max_error_rate)?,
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
