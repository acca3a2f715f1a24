mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use payments_backend::domain::payment::PaymentStatus;
use payments_backend::repo::payments_repo::PaymentStore;
use serde_json::json;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_order_records_pending_payment() {
    let app = app();

    let (status, resp) = send(
        &app.router,
        json_post("/create-order", &json!({ "amount": 49900, "user_id": "user_1" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["amount"], 49900);
    assert_eq!(resp["currency"], "INR");
    assert_eq!(resp["key_id"], "rzp_test_key");
    assert!(resp["receipt"].as_str().unwrap().starts_with("rcpt_"));

    let order_id = resp["order_id"].as_str().unwrap();
    let record = app.store.find_by_order_id(order_id).await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Pending);
    assert_eq!(record.user_id.as_deref(), Some("user_1"));
}

#[tokio::test]
async fn create_order_rejects_invalid_amount_without_gateway_call() {
    let app = app();

    let (status, resp) = send(&app.router, json_post("/create-order", &json!({ "amount": 0 }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "INVALID_AMOUNT");
    assert_eq!(app.gateway.order_calls(), 0);
}

#[tokio::test]
async fn verify_payment_reconciles_record() {
    let app = app();
    app.gateway.insert_payment(captured_payment("pay_1", "order_1", 49900));
    let signature = hex::encode(hmac_sha256(KEY_SECRET, &[b"order_1|pay_1".as_slice()]));

    let (status, resp) = send(
        &app.router,
        json_post(
            "/verify-payment",
            &json!({
                "razorpay_order_id": "order_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": signature,
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "SUCCESS");
    assert_eq!(resp["gateway_status"], "captured");
    let record = app.store.find_by_order_id("order_1").await.unwrap().unwrap();
    assert_eq!(record.status, PaymentStatus::Success);
    assert_eq!(record.customer_email.as_deref(), Some("a@b.com"));
}

#[tokio::test]
async fn verify_payment_rejects_bad_signature() {
    let app = app();
    app.gateway.insert_payment(captured_payment("pay_1", "order_1", 49900));

    let (status, resp) = send(
        &app.router,
        json_post(
            "/verify-payment",
            &json!({
                "razorpay_order_id": "order_1",
                "razorpay_payment_id": "pay_1",
                "razorpay_signature": "deadbeef",
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "INVALID_SIGNATURE");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn payment_lookup_reads_gateway() {
    let app = app();
    app.gateway.insert_payment(captured_payment("pay_1", "order_1", 49900));

    let (status, resp) = send(&app.router, get("/payment/pay_1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["payment_id"], "pay_1");
    assert_eq!(resp["status"], "SUCCESS");

    let (status, resp) = send(&app.router, get("/payment/pay_missing")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "GATEWAY_ERROR");
}

#[tokio::test]
async fn unknown_order_is_not_found_with_error_envelope() {
    let app = app();

    let (status, resp) = send(&app.router, get("/payment/order/order_nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["error"]["code"], "NOT_FOUND");
    assert!(uuid::Uuid::parse_str(resp["error"]["error_id"].as_str().unwrap()).is_ok());
    assert!(resp["error"].get("details").is_none());
}

#[tokio::test]
async fn internal_errors_hide_cause_but_attach_details_outside_production() {
    let app = app();
    app.store.fail_writes(true);

    let (status, resp) = send(&app.router, json_post("/create-order", &json!({ "amount": 100 }))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp["error"]["code"], "INTERNAL_ERROR");
    assert_eq!(resp["error"]["message"], "internal server error");
    assert!(resp["error"]["details"].as_str().unwrap().contains("payment store unavailable"));
}

#[tokio::test]
async fn metrics_require_api_key() {
    let app = app();

    let (status, _) = send(&app.router, get("/metrics")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = Request::builder()
        .uri("/metrics")
        .header("x-api-key", "nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app.router, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/metrics")
        .header("x-api-key", METRICS_KEY)
        .body(Body::empty())
        .unwrap();
    let (status, resp) = send(&app.router, right).await;
    assert_eq!(status, StatusCode::OK);
    // the two rejected calls above were counted
    assert_eq!(resp["client_errors"], 2);
    assert!(resp["requests"].as_u64().unwrap() >= 3);
}

#[tokio::test]
async fn health_reports_status_and_uptime() {
    let app = app();

    let (status, resp) = send(&app.router, get("/health")).await;

    let reported = resp["status"].as_str().unwrap();
    assert!(reported == "healthy" || reported == "degraded");
    assert_eq!(status == StatusCode::OK, reported == "healthy");
    assert!(resp["uptime_secs"].is_u64());
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = app();

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "DENY");
}

#[tokio::test]
async fn oversized_webhook_body_gets_error_envelope() {
    let app = app();
    let body = "x".repeat(128 * 1024);
    let sig = razorpay_signature(RAZORPAY_WEBHOOK_SECRET, body.as_bytes());

    let (status, resp) = send(&app.router, razorpay_webhook(&body, Some(&sig))).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(resp["error"]["error_id"].is_string());
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn oversized_json_body_gets_error_envelope() {
    let app = app();
    let notes = "n".repeat(128 * 1024);

    let (status, resp) = send(
        &app.router,
        json_post("/create-order", &json!({ "amount": 100, "notes": { "memo": notes } })),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(resp["error"]["error_id"].is_string());
    assert_eq!(app.gateway.order_calls(), 0);
}

#[tokio::test]
async fn malformed_json_gets_error_envelope() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/create-order")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, resp) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "INVALID_BODY");
    assert!(uuid::Uuid::parse_str(resp["error"]["error_id"].as_str().unwrap()).is_ok());
    assert_eq!(app.gateway.order_calls(), 0);
}

#[tokio::test]
async fn mistyped_json_field_gets_error_envelope() {
    let app = app();

    let (status, resp) = send(
        &app.router,
        json_post("/refund", &json!({ "payment_id": "pay_1", "amount": "ten" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "INVALID_BODY");
    assert!(resp["error"]["error_id"].is_string());
    assert_eq!(app.gateway.refund_calls(), 0);
}

#[tokio::test]
async fn missing_content_type_gets_error_envelope() {
    let app = app();
    let request = Request::builder()
        .method("POST")
        .uri("/verify-payment")
        .body(Body::from("{}"))
        .unwrap();

    let (status, resp) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"]["code"], "INVALID_BODY");
}
