use crate::domain::payment::{Gateway, PaymentStatus};
use crate::domain::webhook::{NormalizedPayment, NormalizedRefund, WebhookEvent};
use crate::webhooks::normalizer::{parse_json, FieldAliases, NormalizeError};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

// Form-post callbacks from the older API carry no type field.
const LEGACY_PAYMENT_EVENT: &str = "LEGACY_PAYMENT_WEBHOOK";

const EVENT: FieldAliases = FieldAliases::new("type", &["type", "event", "eventType"]);

const ORDER_ID: FieldAliases = FieldAliases::new(
    "order_id",
    &["data.order.order_id", "order_id", "orderId"],
);
const PAYMENT_ID: FieldAliases = FieldAliases::new(
    "payment_id",
    &[
        "data.payment.cf_payment_id",
        "cf_payment_id",
        "cfPaymentId",
        "paymentId",
        "payment_id",
        "referenceId",
    ],
);
const AMOUNT: FieldAliases = FieldAliases::new(
    "amount",
    &[
        "data.payment.payment_amount",
        "data.order.order_amount",
        "payment_amount",
        "order_amount",
        "orderAmount",
    ],
);
const CURRENCY: FieldAliases = FieldAliases::new(
    "currency",
    &[
        "data.payment.payment_currency",
        "data.order.order_currency",
        "payment_currency",
        "order_currency",
        "orderCurrency",
    ],
);
const STATUS: FieldAliases = FieldAliases::new(
    "payment_status",
    &["data.payment.payment_status", "payment_status", "paymentStatus", "txStatus"],
);
const METHOD: FieldAliases = FieldAliases::new(
    "payment_method",
    &["data.payment.payment_group", "payment_group", "paymentMode", "payment_mode"],
);
const EMAIL: FieldAliases = FieldAliases::new(
    "customer_email",
    &[
        "data.customer_details.customer_email",
        "customer_details.customer_email",
        "customerEmail",
        "customer_email",
    ],
);
const USER_ID: FieldAliases = FieldAliases::new(
    "customer_id",
    &[
        "data.customer_details.customer_id",
        "customer_details.customer_id",
        "customerId",
        "customer_id",
    ],
);
const ERROR: FieldAliases = FieldAliases::new(
    "payment_message",
    &[
        "data.error_details.error_description",
        "data.payment.payment_message",
        "payment_message",
        "txMsg",
    ],
);

const REFUND_ID: FieldAliases = FieldAliases::new(
    "refund_id",
    &["data.refund.cf_refund_id", "data.refund.refund_id", "cf_refund_id", "refund_id", "refundId"],
);
const REFUND_PAYMENT_ID: FieldAliases = FieldAliases::new(
    "payment_id",
    &["data.refund.cf_payment_id", "cf_payment_id", "cfPaymentId", "paymentId"],
);
const REFUND_ORDER_ID: FieldAliases = FieldAliases::new(
    "order_id",
    &["data.refund.order_id", "order_id", "orderId"],
);
const REFUND_AMOUNT: FieldAliases = FieldAliases::new(
    "refund_amount",
    &["data.refund.refund_amount", "refund_amount", "refundAmount"],
);
const REFUND_CURRENCY: FieldAliases = FieldAliases::new(
    "refund_currency",
    &["data.refund.refund_currency", "refund_currency", "refundCurrency"],
);
const REFUND_STATUS: FieldAliases = FieldAliases::new(
    "refund_status",
    &["data.refund.refund_status", "refund_status", "refundStatus"],
);

pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, NormalizeError> {
    let payload = parse_json(body)?;
    let event_type = EVENT
        .text(&payload)
        .unwrap_or_else(|| LEGACY_PAYMENT_EVENT.to_string());

    match event_type.as_str() {
        "PAYMENT_SUCCESS_WEBHOOK"
        | "PAYMENT_FAILED_WEBHOOK"
        | "PAYMENT_USER_DROPPED_WEBHOOK"
        | LEGACY_PAYMENT_EVENT => {
            let vendor_status = STATUS
                .text(&payload)
                .unwrap_or_else(|| implied_payment_status(&event_type).to_string());

            Ok(WebhookEvent::Payment(NormalizedPayment {
                gateway: Gateway::Cashfree,
                order_id: ORDER_ID.require_text(&payload)?,
                payment_id: PAYMENT_ID.text(&payload),
                amount: AMOUNT.major_amount(&payload),
                currency: CURRENCY.text(&payload),
                status: PaymentStatus::normalize(&vendor_status),
                method: METHOD.text(&payload),
                email: EMAIL.text(&payload),
                user_id: USER_ID.text(&payload),
                error_message: ERROR.text(&payload),
                event_type,
                raw: payload,
            }))
        }
        "REFUND_STATUS_WEBHOOK" => {
            let payment_id = REFUND_PAYMENT_ID.text(&payload);
            let order_id = REFUND_ORDER_ID.text(&payload);
            if payment_id.is_none() && order_id.is_none() {
                return Err(NormalizeError::MissingField("order_id"));
            }
            let vendor_status = REFUND_STATUS.text(&payload).unwrap_or_default();

            Ok(WebhookEvent::Refund(NormalizedRefund {
                gateway: Gateway::Cashfree,
                refund_id: REFUND_ID.text(&payload),
                payment_id,
                order_id,
                amount: REFUND_AMOUNT.major_amount(&payload),
                currency: REFUND_CURRENCY.text(&payload),
                status: PaymentStatus::from_refund_status(&vendor_status),
                vendor_status,
                email: EMAIL.text(&payload),
                event_type,
                raw: payload,
            }))
        }
        _ => Ok(WebhookEvent::Unrecognized {
            gateway: Gateway::Cashfree,
            event_type,
        }),
    }
}

fn implied_payment_status(event_type: &str) -> &'static str {
    match event_type {
        "PAYMENT_SUCCESS_WEBHOOK" => "SUCCESS",
        "PAYMENT_FAILED_WEBHOOK" => "FAILED",
        "PAYMENT_USER_DROPPED_WEBHOOK" => "USER_DROPPED",
        _ => "PENDING",
    }
}
