pub mod cashfree;
pub mod normalizer;
pub mod razorpay;
pub mod signature;

/// Per-gateway webhook signing secrets. `None` means unconfigured and every
/// delivery for that gateway is rejected.
#[derive(Debug, Clone, Default)]
pub struct WebhookSecrets {
    pub razorpay: Option<String>,
    pub cashfree: Option<String>,
}
