use crate::gateways::{
    GatewayError, GatewayOrder, GatewayOrderRequest, GatewayPayment, GatewayRefund,
    GatewayRefundRequest, PaymentGateway,
};
use crate::webhooks::signature::{self, SignatureScheme};
use serde::de::DeserializeOwned;
use serde_json::json;

pub struct RazorpayGateway {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub timeout_ms: u64,
    pub client: reqwest::Client,
}

impl RazorpayGateway {
    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, GatewayError> {
        let resp = req
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout
                } else {
                    GatewayError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if status.is_success() {
            return resp
                .json::<T>()
                .await
                .map_err(|e| GatewayError::Decode(e.to_string()));
        }

        let body = resp.text().await.unwrap_or_default();
        Err(parse_error(status.as_u16(), &body))
    }
}

fn parse_error(status: u16, body: &str) -> GatewayError {
    let v: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
    let error = v.get("error");
    GatewayError::Api {
        status,
        code: error
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_str())
            .map(ToString::to_string),
        description: error
            .and_then(|e| e.get("description"))
            .and_then(|d| d.as_str())
            .map(ToString::to_string)
            .unwrap_or_else(|| body.chars().take(200).collect()),
    }
}

#[async_trait::async_trait]
impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError> {
        let body = json!({
            "amount": request.amount,
            "currency": request.currency,
            "receipt": request.receipt,
            "notes": request.notes.clone().unwrap_or_else(|| json!({})),
            "payment_capture": 1
        });
        let url = format!("{}/v1/orders", self.base_url);
        self.send(self.client.post(url).json(&body)).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.base_url, payment_id);
        self.send(self.client.get(url)).await
    }

    async fn refund(
        &self,
        payment_id: &str,
        request: &GatewayRefundRequest,
    ) -> Result<GatewayRefund, GatewayError> {
        let mut body = json!({ "amount": request.amount, "speed": "normal" });
        if let Some(notes) = &request.notes {
            body["notes"] = notes.clone();
        }
        let url = format!("{}/v1/payments/{}/refund", self.base_url, payment_id);
        self.send(self.client.post(url).json(&body)).await
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
