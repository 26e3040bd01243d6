use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use kantin_engine::{
    db_types::{CartLine, CartLineStatus, MenuItemId, OrderId},
    traits::LineRemoval,
    CartApi,
};
use serde_json::{json, Value};

use super::helpers::{as_guest, cart_line, line_detail, nasi_goreng, send_request};
use crate::{
    endpoint_tests::mocks::MockStorage,
    routes::{AddToCartRoute, MyCartRoute, RemoveFromCartRoute},
};

fn configure_with(storage: MockStorage) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        cfg.service(MyCartRoute::<MockStorage>::new())
            .service(AddToCartRoute::<MockStorage>::new())
            .service(RemoveFromCartRoute::<MockStorage>::new())
            .app_data(web::Data::new(CartApi::new(storage)));
    }
}

#[actix_web::test]
async fn cart_requires_guest_header() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send_request(TestRequest::get().uri("/cart"), configure_with(MockStorage::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("X-Guest-Id"), "{body}");
}

#[actix_web::test]
async fn blank_guest_header_is_rejected() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/cart").insert_header(("X-Guest-Id", "   "));
    let (status, _) = send_request(req, configure_with(MockStorage::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn list_cart() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_fetch_cart_line_details()
        .returning(|_| Ok(vec![line_detail(cart_line(3, 2, CartLineStatus::InCart, None))]));
    let (status, body) = send_request(as_guest(TestRequest::get().uri("/cart")), configure_with(storage)).await;
    assert_eq!(status, StatusCode::OK);
    let lines: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(lines[0]["id"], json!(3));
    assert_eq!(lines[0]["quantity"], json!(2));
    assert_eq!(lines[0]["status"], json!("in_cart"));
    assert_eq!(lines[0]["menu_item_name"], json!("Nasi Goreng"));
    assert_eq!(lines[0]["vendor_name"], json!("Warung Bu Sri"));
}

#[actix_web::test]
async fn add_item_to_cart() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_menu_item().returning(|_, _| Ok(Some(nasi_goreng())));
    storage
        .expect_upsert_cart_line()
        .withf(|guest, item, quantity| guest.as_str() == "guest-alice" && item.id == MenuItemId(11) && *quantity == 2)
        .times(1)
        .returning(|_, _, quantity| Ok(Some(cart_line(1, quantity, CartLineStatus::InCart, None))));
    let req = as_guest(TestRequest::post().uri("/cart"))
        .set_json(json!({ "vendor_id": 1, "menu_item_id": 11, "quantity": 2 }));
    let (status, body) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::OK);
    let line: CartLine = serde_json::from_str(&body).unwrap();
    assert_eq!(line.quantity, 2);
    assert_eq!(line.total_price.value(), 20_000);
}

#[actix_web::test]
async fn quantity_defaults_to_one() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_menu_item().returning(|_, _| Ok(Some(nasi_goreng())));
    storage
        .expect_upsert_cart_line()
        .withf(|_, _, quantity| *quantity == 1)
        .times(1)
        .returning(|_, _, quantity| Ok(Some(cart_line(1, quantity, CartLineStatus::InCart, None))));
    let req = as_guest(TestRequest::post().uri("/cart")).set_json(json!({ "vendor_id": 1, "menu_item_id": 11 }));
    let (status, _) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn zero_quantity_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_upsert_cart_line().never();
    let req = as_guest(TestRequest::post().uri("/cart"))
        .set_json(json!({ "vendor_id": 1, "menu_item_id": 11, "quantity": 0 }));
    let (status, body) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Quantity must be positive"), "{body}");
}

#[actix_web::test]
async fn oversized_quantity_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_menu_item().never();
    storage.expect_upsert_cart_line().never();
    let req = as_guest(TestRequest::post().uri("/cart"))
        .set_json(json!({ "vendor_id": 1, "menu_item_id": 11, "quantity": i64::MAX / 1000 }));
    let (status, body) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("At most 100 units"), "{body}");
}

#[actix_web::test]
async fn full_cart_line_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_menu_item().returning(|_, _| Ok(Some(nasi_goreng())));
    storage.expect_upsert_cart_line().times(1).returning(|_, _, _| Ok(None));
    let req = as_guest(TestRequest::post().uri("/cart"))
        .set_json(json!({ "vendor_id": 1, "menu_item_id": 11, "quantity": 5 }));
    let (status, body) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("at most 100 units"), "{body}");
}

#[actix_web::test]
async fn unknown_menu_item() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_menu_item().returning(|_, _| Ok(None));
    let req = as_guest(TestRequest::post().uri("/cart"))
        .set_json(json!({ "vendor_id": 1, "menu_item_id": 99, "quantity": 1 }));
    let (status, _) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn remove_one_unit() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_cart_line().returning(|id| Ok(Some(cart_line(id, 2, CartLineStatus::InCart, None))));
    storage
        .expect_remove_one_unit()
        .times(1)
        .returning(|id| Ok(LineRemoval::Decremented(cart_line(id, 1, CartLineStatus::InCart, None))));
    let (status, body) =
        send_request(as_guest(TestRequest::delete().uri("/cart/5")), configure_with(storage)).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["line_id"], json!(5));
    assert_eq!(res["deleted"], json!(false));
    assert_eq!(res["line"]["quantity"], json!(1));
}

#[actix_web::test]
async fn remove_last_unit_deletes_line() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_cart_line().returning(|id| Ok(Some(cart_line(id, 1, CartLineStatus::InCart, None))));
    storage.expect_remove_one_unit().returning(|id| Ok(LineRemoval::Deleted(id)));
    let (status, body) =
        send_request(as_guest(TestRequest::delete().uri("/cart/5")), configure_with(storage)).await;
    assert_eq!(status, StatusCode::OK);
    let res: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(res["deleted"], json!(true));
    assert_eq!(res["line"], Value::Null);
}

#[actix_web::test]
async fn cannot_remove_someone_elses_line() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage.expect_fetch_cart_line().returning(|id| Ok(Some(cart_line(id, 1, CartLineStatus::InCart, None))));
    storage.expect_remove_one_unit().never();
    let req = TestRequest::delete().uri("/cart/5").insert_header(("X-Guest-Id", "guest-bob"));
    let (status, _) = send_request(req, configure_with(storage)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cannot_remove_checked_out_line() {
    let _ = env_logger::try_init().ok();
    let mut storage = MockStorage::new();
    storage
        .expect_fetch_cart_line()
        .returning(|id| Ok(Some(cart_line(id, 1, CartLineStatus::Unpaid, Some(OrderId(4))))));
    storage.expect_remove_one_unit().never();
    let (status, body) =
        send_request(as_guest(TestRequest::delete().uri("/cart/5")), configure_with(storage)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("already been checked out"), "{body}");
}
