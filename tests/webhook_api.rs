mod common;

use common::*;
use payments_backend::domain::payment::{PaymentStatus, PaymentUpdate};
use payments_backend::gateways::mock::MockBehavior;
use payments_backend::repo::payments_repo::PaymentStore;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn payment_captured_marks_success_and_sends_confirmation() {
    let app = app();
    let body = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, body.as_bytes());

    let (status, resp) = send(&app.router, razorpay_webhook(&body, Some(&sig))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "status": "success" }));

    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.payment_id.as_deref(), Some("pay_1"));
    assert_eq!(record.amount, 49900);
    assert_eq!(record.user_id.as_deref(), Some("user_1"));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "a@b.com");
    assert!(sent[0].html.contains("INR 499.00"));
}

#[tokio::test]
async fn redelivered_capture_does_not_email_twice() {
    let app = app();
    let body = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, body.as_bytes());

    let (first, _) = send(&app.router, razorpay_webhook(&body, Some(&sig))).await;
    let (second, _) = send(&app.router, razorpay_webhook(&body, Some(&sig))).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(app.notifier.sent().len(), 1);
}

#[tokio::test]
async fn bad_signature_is_rejected_and_record_unchanged() {
    let app = app();
    app.store
        .upsert(
            "order_1",
            &PaymentUpdate {
                amount: Some(49900),
                status: Some(PaymentStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let writes_before = app.store.write_count();

    let body = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");
    let forged = razorpay_signature("not-the-secret", body.as_bytes());
    let (status, resp) = send(&app.router, razorpay_webhook(&body, Some(&forged))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(resp["error"]["error_id"].is_string());
    assert_eq!(app.store.write_count(), writes_before);
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert!(app.notifier.sent().is_empty());
}

#[tokio::test]
async fn missing_signature_is_bad_request_without_writes() {
    let app = app();
    let body = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");

    let (status, resp) = send(&app.router, razorpay_webhook(&body, None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "MISSING_SIGNATURE");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn signed_but_malformed_payload_is_bad_request() {
    let app = app();
    let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1"}}}}"#;
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, body.as_bytes());

    let (status, resp) = send(&app.router, razorpay_webhook(body, Some(&sig))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "INVALID_PAYLOAD");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn unrecognized_event_is_acknowledged() {
    let app = app();
    let body = r#"{"event":"subscription.charged","payload":{}}"#;
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, body.as_bytes());

    let (status, resp) = send(&app.router, razorpay_webhook(body, Some(&sig))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "status": "success" }));
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn notifier_failure_still_acknowledges() {
    let app = app_with(MockBehavior::AlwaysSuccess, RecordingNotifier::failing());
    let body = payment_captured_body("order_9", "pay_9", 100, "x@y.com");
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, body.as_bytes());

    let (status, _) = send(&app.router, razorpay_webhook(&body, Some(&sig))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.notifier.sent().len(), 1);
    let record = app.store.find_by_order_id("order_9").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
}

#[tokio::test]
async fn late_failure_does_not_downgrade_captured_payment() {
    let app = app();
    let captured = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, captured.as_bytes());
    send(&app.router, razorpay_webhook(&captured, Some(&sig))).await;

    let failed = json!({
        "event": "payment.failed",
        "payload": { "payment": { "entity": {
            "id": "pay_0", "order_id": "order_1", "amount": 49900,
            "currency": "INR", "status": "failed",
            "error_description": "card declined"
        }}}
    })
    .to_string();
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, failed.as_bytes());
    let (status, _) = send(&app.router, razorpay_webhook(&failed, Some(&sig))).await;

    assert_eq!(status, StatusCode::OK);
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.payment_id.as_deref(), Some("pay_1"));
    assert!(record.error_message.is_none());
}

#[tokio::test]
async fn refund_processed_webhook_marks_refunded() {
    let app = app();
    let captured = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, captured.as_bytes());
    send(&app.router, razorpay_webhook(&captured, Some(&sig))).await;

    let refund = json!({
        "event": "refund.processed",
        "payload": { "refund": { "entity": {
            "id": "rfnd_1", "payment_id": "pay_1", "amount": 49900,
            "currency": "INR", "status": "processed"
        }}}
    })
    .to_string();
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, refund.as_bytes());
    let (status, _) = send(&app.router, razorpay_webhook(&refund, Some(&sig))).await;

    assert_eq!(status, StatusCode::OK);
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Refunded);
    assert_eq!(record.refund_id.as_deref(), Some("rfnd_1"));
    assert_eq!(record.refund_amount, Some(49900));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].subject, "Your refund has been processed");
}

fn refund_processed_body(refund_id: &str, payment_id: &str, amount: i64) -> String {
    json!({
        "event": "refund.processed",
        "payload": { "refund": { "entity": {
            "id": refund_id, "payment_id": payment_id, "amount": amount,
            "currency": "INR", "status": "processed"
        }}}
    })
    .to_string()
}

#[tokio::test]
async fn partial_refund_webhooks_accumulate_until_fully_refunded() {
    let app = app();
    let captured = payment_captured_body("order_1", "pay_1", 49900, "a@b.com");
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, captured.as_bytes());
    send(&app.router, razorpay_webhook(&captured, Some(&sig))).await;

    let first = refund_processed_body("rfnd_1", "pay_1", 20000);
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, first.as_bytes());
    let (status, _) = send(&app.router, razorpay_webhook(&first, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.refund_amount, Some(20000));

    // redelivery of the same refund is not counted twice
    let (status, _) = send(&app.router, razorpay_webhook(&first, Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.refund_amount, Some(20000));

    let rest = refund_processed_body("rfnd_2", "pay_1", 29900);
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, rest.as_bytes());
    send(&app.router, razorpay_webhook(&rest, Some(&sig))).await;
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Refunded);
    assert_eq!(record.refund_amount, Some(49900));
    assert_eq!(record.refund_id.as_deref(), Some("rfnd_2"));

    let sent = app.notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].subject, "Your refund has been processed");
}

#[tokio::test]
async fn cashfree_success_webhook_uses_timestamped_signature() {
    let app = app();
    let body = json!({
        "type": "PAYMENT_SUCCESS_WEBHOOK",
        "data": {
            "order": { "order_id": "cf_order_1", "order_amount": 499.0, "order_currency": "INR" },
            "payment": {
                "cf_payment_id": 5114910,
                "payment_status": "SUCCESS",
                "payment_amount": 499.0,
                "payment_currency": "INR",
                "payment_group": "upi"
            },
            "customer_details": { "customer_email": "c@d.com", "customer_id": "user_7" }
        }
    })
    .to_string();
    let ts = "1700000000";
    let sig = cashfree_signature(CASHFREE_WEBHOOK_SECRET, ts, body.as_bytes());

    let (status, resp) = send(&app.router, cashfree_webhook(&body, ts, &sig)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp, json!({ "status": "success" }));
    let record = app.store.find_by_order_id("cf_order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.gateway, "cashfree");
    assert_eq!(record.amount, 49900);
    assert_eq!(record.payment_id.as_deref(), Some("5114910"));
    assert_eq!(app.notifier.sent()[0].to, "c@d.com");
}

#[tokio::test]
async fn cashfree_signature_over_other_timestamp_is_rejected() {
    let app = app();
    let body = r#"{"type":"PAYMENT_SUCCESS_WEBHOOK","data":{"order":{"order_id":"cf_order_1"}}}"#;
    let sig = cashfree_signature(CASHFREE_WEBHOOK_SECRET, "1700000000", body.as_bytes());

    let (status, _) = send(&app.router, cashfree_webhook(body, "1700000001", &sig)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.write_count(), 0);
}
