use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use chrono::Utc;
use kantin_engine::{
    db_types::{CartLineStatus, OrderId, PaymentMethod, PaymentRecord, PaymentStatus},
    payment_objects::PaymentConfig,
    traits::{InsertPaymentResult, ProviderAction, ProviderChargeResponse, ProviderError, StorageError},
    PaymentApi,
};
use serde_json::{json, Value};

use super::helpers::{as_guest, cart_line, line_detail, order, payment_record, send_request};
use crate::{
    endpoint_tests::mocks::{MockProvider, MockStorage},
    routes::{CheckoutRoute, PayForOrderRoute, PaymentStatusRoute},
};

fn configure_with(storage: MockStorage, provider: MockProvider) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(CheckoutRoute::<MockStorage, MockProvider>::new())
            .service(PayForOrderRoute::<MockStorage, MockProvider>::new())
            .service(PaymentStatusRoute::<MockStorage, MockProvider>::new())
            .app_data(web::Data::new(PaymentApi::new(storage, provider, PaymentConfig::default())));
    }
}

fn checkout_body(payment_method: i32) -> Value {
    json!({ "buyer_name": "Alice", "seat": "A7", "email": "alice@example.com", "payment_method": payment_method })
}

/// Storage for a guest whose cart holds 2 x Nasi Goreng. Order #7 is created at checkout.
fn storage_with_cart() -> MockStorage {
    let mut storage = MockStorage::new();
    storage
        .expect_checkout_cart()
        .withf(|guest, buyer| guest.as_str() == "guest-alice" && buyer.seat == "A7")
        .times(1)
        .returning(|_, _| Ok(Some((order(7, 20_000), vec![cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7)))]))));
    storage
        .expect_fetch_cart_line_details()
        .returning(|_| Ok(vec![line_detail(cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7))))]));
    storage.expect_insert_payment_record().returning(|r| {
        Ok(InsertPaymentResult::Inserted(PaymentRecord {
            id: 1,
            order_id: r.order_id,
            provider_transaction_id: r.provider_transaction_id,
            provider_order_id: r.provider_order_id,
            payment_method: r.payment_method,
            gross_amount: r.gross_amount,
            status: PaymentStatus::Pending,
            payment_data: r.payment_data,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    });
    storage
}

fn gopay_response(reference: &str) -> ProviderChargeResponse {
    ProviderChargeResponse {
        transaction_id: "231c79c5-e39e-4993-86da-cadcaee56c1d".into(),
        order_id: reference.to_string(),
        actions: vec![
            ProviderAction::new("generate-qr-code", "https://api.sandbox.midtrans.com/v2/gopay/231c79c5/qr-code"),
            ProviderAction::new("deeplink-redirect", "https://simulator.sandbox.midtrans.com/gopay/ui/checkout"),
            ProviderAction::new("get-status", "https://api.sandbox.midtrans.com/v2/231c79c5/status"),
        ],
    }
}

#[actix_web::test]
async fn checkout_with_gopay() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider
        .expect_charge()
        .withf(|req| {
            req.payment_method == PaymentMethod::Gopay &&
                req.gross_amount.value() == 20_000 &&
                req.provider_order_id.starts_with("KP-7-") &&
                req.items.len() == 1 &&
                req.customer.name == "Alice"
        })
        .times(1)
        .returning(|req| Ok(gopay_response(&req.provider_order_id)));
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(2));
    let (status, body) = send_request(req, configure_with(storage_with_cart(), provider)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let receipt: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(receipt["order"]["id"], json!(7));
    assert_eq!(receipt["order"]["total_price"], json!(20_000));
    assert_eq!(receipt["lines"][0]["status"], json!("unpaid"));
    assert_eq!(receipt["payment"]["method"], json!("gopay"));
    assert_eq!(receipt["payment"]["status"], json!("pending"));
    assert_eq!(receipt["payment"]["action"]["key"], json!("https://simulator.sandbox.midtrans.com/gopay/ui/checkout"));
    assert_eq!(receipt["payment"]["action"]["qr"], json!("https://api.sandbox.midtrans.com/v2/gopay/231c79c5/qr-code"));
    assert!(receipt["payment"]["provider_order_id"].as_str().unwrap().starts_with("KP-7-"));
}

#[actix_web::test]
async fn checkout_with_cash_skips_the_provider() {
    let _ = env_logger::try_init().ok();
    let mut provider = MockProvider::new();
    provider.expect_charge().never();
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(1));
    let (status, body) = send_request(req, configure_with(storage_with_cart(), provider)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let receipt: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(receipt["payment"]["method"], json!("cash"));
    assert!(receipt["payment"]["provider_order_id"].as_str().unwrap().starts_with("CL-7-"));
    assert_eq!(receipt["payment"]["action"], json!({ "key": "", "qr": "" }));
}

#[actix_web::test]
async fn checkout_with_empty_cart() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_checkout_cart().returning(|_, _| Ok(None));
    storage.expect_insert_payment_record().never();
    let mut provider = MockProvider::new();
    provider.expect_charge().never();
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(2));
    let (status, body) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("nothing in the cart"), "{body}");
}

#[actix_web::test]
async fn checkout_with_unknown_payment_method() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_checkout_cart().never();
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(9));
    let (status, _) = send_request(req, configure_with(storage, MockProvider::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn checkout_without_seat() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_checkout_cart().never();
    let body = json!({ "buyer_name": "Alice", "seat": " ", "payment_method": 1 });
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(body);
    let (status, body) = send_request(req, configure_with(storage, MockProvider::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("seat"), "{body}");
}

#[actix_web::test]
async fn provider_failure_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_checkout_cart()
        .returning(|_, _| Ok(Some((order(7, 20_000), vec![cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7)))]))));
    storage
        .expect_fetch_cart_line_details()
        .returning(|_| Ok(vec![line_detail(cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7))))]));
    storage.expect_insert_payment_record().never();
    let mut provider = MockProvider::new();
    provider.expect_charge().returning(|_| Err(ProviderError::Unreachable("connection refused".into())));
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(3));
    let (status, body) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("connection refused"), "{body}");
}

#[actix_web::test]
async fn charge_without_qr_action_is_a_bad_gateway() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_checkout_cart()
        .returning(|_, _| Ok(Some((order(7, 20_000), vec![cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7)))]))));
    storage
        .expect_fetch_cart_line_details()
        .returning(|_| Ok(vec![line_detail(cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7))))]));
    storage.expect_insert_payment_record().never();
    let mut provider = MockProvider::new();
    provider.expect_charge().returning(|req| {
        Ok(ProviderChargeResponse {
            transaction_id: "tx".into(),
            order_id: req.provider_order_id,
            actions: vec![ProviderAction::new("get-status", "https://status")],
        })
    });
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(3));
    let (status, _) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[actix_web::test]
async fn unsaved_payment_record_after_charge_is_an_error() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_checkout_cart()
        .returning(|_, _| Ok(Some((order(7, 20_000), vec![cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7)))]))));
    storage
        .expect_fetch_cart_line_details()
        .returning(|_| Ok(vec![line_detail(cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7))))]));
    storage
        .expect_insert_payment_record()
        .times(1)
        .returning(|_| Err(StorageError::DatabaseError("database is locked".into())));
    let mut provider = MockProvider::new();
    provider.expect_charge().times(1).returning(|req| Ok(gopay_response(&req.provider_order_id)));
    let req = as_guest(TestRequest::post().uri("/checkout")).set_json(checkout_body(2));
    let (status, body) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Saving payment record"), "{body}");
    assert!(!body.contains("provider_order_id"), "{body}");
}

#[actix_web::test]
async fn retry_charges_only_the_lines_still_unpaid() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    // The order was 30 000, but one vendor has since cancelled their 10 000 line
    storage.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 30_000))));
    let mut lookups = 0;
    storage.expect_fetch_payment_record_for_order().returning(move |id| {
        lookups += 1;
        match lookups {
            1 => Ok(None),
            _ => Ok(Some(payment_record(id.value(), "KP-7-1717171717", PaymentMethod::Gopay, PaymentStatus::Pending))),
        }
    });
    storage
        .expect_fetch_cart_line_details()
        .withf(|filter| filter.status.as_deref() == Some(&[CartLineStatus::Unpaid][..]))
        .returning(|_| Ok(vec![line_detail(cart_line(1, 2, CartLineStatus::Unpaid, Some(OrderId(7))))]));
    storage
        .expect_insert_payment_record()
        .withf(|r| r.gross_amount.value() == 20_000)
        .times(1)
        .returning(|r| {
            Ok(InsertPaymentResult::Inserted(PaymentRecord {
                id: 2,
                order_id: r.order_id,
                provider_transaction_id: r.provider_transaction_id,
                provider_order_id: r.provider_order_id,
                payment_method: r.payment_method,
                gross_amount: r.gross_amount,
                status: PaymentStatus::Pending,
                payment_data: r.payment_data,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }))
        });
    let mut provider = MockProvider::new();
    provider
        .expect_charge()
        .withf(|req| {
            let items: i64 = req.items.iter().map(|i| i.price.value() * i.quantity).sum();
            req.gross_amount.value() == 20_000 && items == 20_000
        })
        .times(1)
        .returning(|req| Ok(gopay_response(&req.provider_order_id)));
    let req = as_guest(TestRequest::post().uri("/orders/7/pay")).set_json(json!({ "payment_method": 2 }));
    let (status, body) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let detail: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(detail["status"], json!("pending"));
}

#[actix_web::test]
async fn pay_for_order_returns_existing_payment() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 20_000))));
    storage
        .expect_fetch_payment_record_for_order()
        .returning(|id| Ok(Some(payment_record(id.value(), "KP-7-1717171717", PaymentMethod::Qris, PaymentStatus::Pending))));
    storage.expect_insert_payment_record().never();
    let mut provider = MockProvider::new();
    provider.expect_charge().never();
    let req = as_guest(TestRequest::post().uri("/orders/7/pay")).set_json(json!({ "payment_method": 2 }));
    let (status, body) = send_request(req, configure_with(storage, provider)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let detail: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(detail["provider_order_id"], json!("KP-7-1717171717"));
    assert_eq!(detail["method"], json!("qris"));
}

#[actix_web::test]
async fn cannot_pay_for_someone_elses_order() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_order().returning(|id| Ok(Some(order(id.value(), 20_000))));
    storage.expect_fetch_payment_record_for_order().never();
    let req = TestRequest::post()
        .uri("/orders/7/pay")
        .insert_header(("X-Guest-Id", "guest-bob"))
        .set_json(json!({ "payment_method": 1 }));
    let (status, _) = send_request(req, configure_with(storage, MockProvider::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn payment_status() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_fetch_payment_record_for_order()
        .returning(|id| Ok(Some(payment_record(id.value(), "KP-7-1717171717", PaymentMethod::Gopay, PaymentStatus::Success))));
    let (status, body) =
        send_request(TestRequest::get().uri("/payments/7"), configure_with(storage, MockProvider::new())).await;
    assert_eq!(status, StatusCode::OK);
    let detail: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(detail["order_id"], json!(7));
    assert_eq!(detail["status"], json!("success"));
    assert_eq!(detail["action"]["key"], json!("gojek://gopay/merchanttransfer"));
}

#[actix_web::test]
async fn payment_status_for_unpaid_order() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_payment_record_for_order().returning(|_| Ok(None));
    let (status, _) =
        send_request(TestRequest::get().uri("/payments/7"), configure_with(storage, MockProvider::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
