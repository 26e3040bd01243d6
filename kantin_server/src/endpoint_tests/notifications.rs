use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kantin_common::Secret;
use kantin_engine::{
    db_types::{PaymentMethod, PaymentStatus},
    events::EventProducers,
    traits::{ProviderError, ProviderStatus},
    NotificationApi,
};
use midtrans_tools::helpers::notification_signature;
use serde_json::{json, Value};

use super::helpers::{order, payment_record, send_request};
use crate::{
    endpoint_tests::mocks::{MockProvider, MockStorage},
    middleware::SignatureMiddlewareFactory,
    routes::MidtransNotificationRoute,
};

const SERVER_KEY: &str = "SB-Mid-server-endpoint-tests";
const REFERENCE: &str = "KP-7-1717171717";

fn configure_with(storage: MockStorage, provider: MockProvider) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = NotificationApi::new(storage, provider, EventProducers::default());
        cfg.service(MidtransNotificationRoute::<MockStorage, MockProvider>::new()).app_data(web::Data::new(api));
    }
}

fn configure_signed(storage: MockStorage, provider: MockProvider) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = NotificationApi::new(storage, provider, EventProducers::default());
        let scope = web::scope("/midtrans")
            .wrap(SignatureMiddlewareFactory::new(Secret::new(SERVER_KEY.to_string()), true))
            .service(MidtransNotificationRoute::<MockStorage, MockProvider>::new());
        cfg.service(scope).app_data(web::Data::new(api));
    }
}

fn notification(transaction_status: &str) -> Value {
    json!({
        "transaction_time": "2024-06-01 12:06:00",
        "transaction_status": transaction_status,
        "transaction_id": "231c79c5-e39e-4993-86da-cadcaee56c1d",
        "status_code": "200",
        "payment_type": "gopay",
        "order_id": REFERENCE,
        "gross_amount": "20000.00",
        "fraud_status": "accept",
        "currency": "IDR"
    })
}

fn signed_notification(transaction_status: &str) -> Value {
    let mut body = notification(transaction_status);
    body["signature_key"] = json!(notification_signature(REFERENCE, "200", "20000.00", SERVER_KEY));
    body
}

/// Storage holding a pending GoPay payment that moves to `success` when asked to.
fn storage_with_pending_payment() -> MockStorage {
    let mut storage = MockStorage::new();
    storage
        .expect_fetch_payment_record_by_provider_order_id()
        .returning(|r| Ok(Some(payment_record(7, r, PaymentMethod::Gopay, PaymentStatus::Pending))));
    storage
        .expect_transition_payment_status()
        .withf(|r, observed, new_status| {
            r == REFERENCE && *observed == PaymentStatus::Pending && *new_status == PaymentStatus::Success
        })
        .times(1)
        .returning(|r, _, new_status| Ok(Some(payment_record(7, r, PaymentMethod::Gopay, new_status))));
    storage.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 20_000))));
    storage
}

fn provider_reporting(transaction_status: &'static str) -> MockProvider {
    let mut provider = MockProvider::new();
    provider
        .expect_query_status()
        .returning(move |r| Ok(ProviderStatus::new(r, transaction_status).with_fraud_status("accept")));
    provider
}

#[actix_web::test]
async fn settlement_marks_payment_successful() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/notification").set_json(notification("settlement"));
    let config = configure_with(storage_with_pending_payment(), provider_reporting("settlement"));
    let (status, body) = send_request(req, config).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], json!(true));
    assert_eq!(ack["status"], json!("success"));
}

#[actix_web::test]
async fn provider_status_wins_over_payload() {
    let _ = env_logger::try_init().ok();
    // The payload claims settlement but the provider says the payment is still pending
    let mut storage = MockStorage::new();
    storage
        .expect_fetch_payment_record_by_provider_order_id()
        .returning(|r| Ok(Some(payment_record(7, r, PaymentMethod::Gopay, PaymentStatus::Pending))));
    storage.expect_transition_payment_status().never();
    let req = TestRequest::post().uri("/notification").set_json(notification("settlement"));
    let (status, body) = send_request(req, configure_with(storage, provider_reporting("pending"))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], json!(true));
    assert_eq!(ack["status"], json!("pending"));
}

#[actix_web::test]
async fn conflicting_notification_is_acknowledged_without_change() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_fetch_payment_record_by_provider_order_id()
        .returning(|r| Ok(Some(payment_record(7, r, PaymentMethod::Gopay, PaymentStatus::Success))));
    storage.expect_transition_payment_status().never();
    let req = TestRequest::post().uri("/notification").set_json(notification("deny"));
    let (status, body) = send_request(req, configure_with(storage, provider_reporting("deny"))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["success"], json!(false));
    assert!(ack.get("status").is_none());
}

#[actix_web::test]
async fn notification_without_order_id() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().never();
    let req = TestRequest::post().uri("/notification").set_json(json!({ "transaction_status": "settlement" }));
    let (status, body) = send_request(req, configure_with(MockStorage::new(), provider)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("order_id"), "{body}");
}

#[actix_web::test]
async fn notification_for_unknown_payment() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_payment_record_by_provider_order_id().returning(|_| Ok(None));
    let req = TestRequest::post().uri("/notification").set_json(notification("settlement"));
    let (status, _) = send_request(req, configure_with(storage, provider_reporting("settlement"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn provider_outage_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_payment_record_by_provider_order_id().never();
    let mut provider = MockProvider::new();
    provider.expect_query_status().returning(|_| Err(ProviderError::Unreachable("timed out".into())));
    let req = TestRequest::post().uri("/notification").set_json(notification("settlement"));
    let (status, _) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn signed_notification_is_accepted() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post().uri("/midtrans/notification").set_json(signed_notification("settlement"));
    let config = configure_signed(storage_with_pending_payment(), provider_reporting("settlement"));
    let (status, body) = send_request(req, config).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let ack: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(ack["status"], json!("success"));
}

#[actix_web::test]
async fn unsigned_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().never();
    let req = TestRequest::post().uri("/midtrans/notification").set_json(notification("settlement"));
    let (status, body) = send_request(req, configure_signed(MockStorage::new(), provider)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Notification is not signed.");
}

#[actix_web::test]
async fn forged_notification_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_query_status().never();
    let mut body = notification("settlement");
    body["signature_key"] = json!(notification_signature(REFERENCE, "200", "20000.00", "not-our-key"));
    let req = TestRequest::post().uri("/midtrans/notification").set_json(body);
    let (status, body) = send_request(req, configure_signed(MockStorage::new(), provider)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid notification signature.");
}

#[actix_web::test]
async fn notification_that_is_not_json() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::post()
        .uri("/midtrans/notification")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("order_id=KP-7-1717171717");
    let (status, _) = send_request(req, configure_signed(MockStorage::new(), MockProvider::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
