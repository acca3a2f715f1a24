use crate::domain::payment::{Gateway, PaymentStatus};
use crate::domain::webhook::{NormalizedPayment, NormalizedRefund, WebhookEvent};
use crate::webhooks::normalizer::{parse_json, FieldAliases, NormalizeError};

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

const EVENT: FieldAliases = FieldAliases::new("event", &["event"]);

const ORDER_ID: FieldAliases = FieldAliases::new(
    "order_id",
    &[
        "payload.payment.entity.order_id",
        "payload.order.entity.id",
        "payload.payment_link.entity.order_id",
    ],
);
const PAYMENT_ID: FieldAliases = FieldAliases::new("payment_id", &["payload.payment.entity.id"]);
const AMOUNT: FieldAliases = FieldAliases::new(
    "amount",
    &[
        "payload.payment.entity.amount",
        "payload.order.entity.amount_paid",
        "payload.order.entity.amount",
        "payload.payment_link.entity.amount_paid",
    ],
);
const CURRENCY: FieldAliases = FieldAliases::new(
    "currency",
    &[
        "payload.payment.entity.currency",
        "payload.order.entity.currency",
        "payload.payment_link.entity.currency",
    ],
);
const STATUS: FieldAliases = FieldAliases::new(
    "status",
    &["payload.payment.entity.status", "payload.order.entity.status"],
);
const METHOD: FieldAliases = FieldAliases::new("method", &["payload.payment.entity.method"]);
const EMAIL: FieldAliases = FieldAliases::new(
    "email",
    &[
        "payload.payment.entity.email",
        "payload.payment_link.entity.customer.email",
    ],
);
const USER_ID: FieldAliases = FieldAliases::new(
    "user_id",
    &[
        "payload.payment.entity.notes.user_id",
        "payload.order.entity.notes.user_id",
        "payload.payment_link.entity.notes.user_id",
    ],
);
const ERROR: FieldAliases = FieldAliases::new("error", &["payload.payment.entity.error_description"]);

const REFUND_ID: FieldAliases = FieldAliases::new("refund_id", &["payload.refund.entity.id"]);
const REFUND_PAYMENT_ID: FieldAliases = FieldAliases::new(
    "payment_id",
    &["payload.refund.entity.payment_id", "payload.payment.entity.id"],
);
const REFUND_AMOUNT: FieldAliases = FieldAliases::new("amount", &["payload.refund.entity.amount"]);
const REFUND_CURRENCY: FieldAliases = FieldAliases::new(
    "currency",
    &["payload.refund.entity.currency", "payload.payment.entity.currency"],
);
const REFUND_STATUS: FieldAliases = FieldAliases::new("refund_status", &["payload.refund.entity.status"]);

pub fn parse_event(body: &[u8]) -> Result<WebhookEvent, NormalizeError> {
    let payload = parse_json(body)?;
    let event_type = EVENT.require_text(&payload)?;

    match event_type.as_str() {
        "payment.authorized" | "payment.captured" | "payment.failed" | "order.paid"
        | "payment_link.paid" => {
            let vendor_status = STATUS
                .text(&payload)
                .unwrap_or_else(|| implied_payment_status(&event_type).to_string());

            Ok(WebhookEvent::Payment(NormalizedPayment {
                gateway: Gateway::Razorpay,
                order_id: ORDER_ID.require_text(&payload)?,
                payment_id: PAYMENT_ID.text(&payload),
                amount: AMOUNT.minor_amount(&payload),
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
        "refund.created" | "refund.processed" | "refund.failed" => {
            let payment_id = REFUND_PAYMENT_ID.text(&payload);
            let order_id = ORDER_ID.text(&payload);
            if payment_id.is_none() && order_id.is_none() {
                return Err(NormalizeError::MissingField("payment_id"));
            }
            let vendor_status = REFUND_STATUS
                .text(&payload)
                .unwrap_or_else(|| implied_refund_status(&event_type).to_string());

            Ok(WebhookEvent::Refund(NormalizedRefund {
                gateway: Gateway::Razorpay,
                refund_id: REFUND_ID.text(&payload),
                payment_id,
                order_id,
                amount: REFUND_AMOUNT.minor_amount(&payload),
                currency: REFUND_CURRENCY.text(&payload),
                status: PaymentStatus::from_refund_status(&vendor_status),
                vendor_status,
                email: EMAIL.text(&payload),
                event_type,
                raw: payload,
            }))
        }
        _ => Ok(WebhookEvent::Unrecognized {
            gateway: Gateway::Razorpay,
            event_type,
        }),
    }
}

fn implied_payment_status(event_type: &str) -> &'static str {
    match event_type {
        "payment.captured" | "order.paid" | "payment_link.paid" => "captured",
        "payment.failed" => "failed",
        _ => "authorized",
    }
}

fn implied_refund_status(event_type: &str) -> &'static str {
    match event_type {
        "refund.processed" => "processed",
        "refund.failed" => "failed",
        _ => "pending",
    }
}
