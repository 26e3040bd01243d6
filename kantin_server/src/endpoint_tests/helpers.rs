use std::str::FromStr;

use actix_web::{http::StatusCode, test, test::TestRequest, web::ServiceConfig, App, ResponseError};
use chrono::{TimeZone, Utc};
use kantin_engine::db_types::{
    CartLine,
    CartLineDetail,
    CartLineStatus,
    GuestId,
    MenuItem,
    MenuItemId,
    Order,
    OrderId,
    PaymentMethod,
    PaymentRecord,
    PaymentStatus,
    Rupiah,
    VendorId,
};
use log::debug;

use crate::helpers::GUEST_ID_HEADER;

pub const GUEST: &str = "guest-alice";

/// Sends `req` to an app built with `configure`. Errors raised by middleware are turned into their HTTP response, the
/// way the server would send them.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = test::init_service(App::new().configure(configure)).await;
    debug!("Making request");
    match test::try_call_service(&app, req.to_request()).await {
        Ok(res) => {
            let status = res.status();
            let body = test::read_body(res).await;
            (status, String::from_utf8_lossy(&body).into_owned())
        },
        Err(e) => {
            let status = e.as_response_error().status_code();
            (status, e.to_string())
        },
    }
}

pub fn as_guest(req: TestRequest) -> TestRequest {
    req.insert_header((GUEST_ID_HEADER, GUEST))
}

pub fn guest() -> GuestId {
    GuestId::from_str(GUEST).unwrap()
}

pub fn nasi_goreng() -> MenuItem {
    MenuItem { id: MenuItemId(11), vendor_id: VendorId(1), name: "Nasi Goreng".into(), price: Rupiah::from(10_000) }
}

pub fn cart_line(id: i64, quantity: i64, status: CartLineStatus, order_id: Option<OrderId>) -> CartLine {
    let item = nasi_goreng();
    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    CartLine {
        id,
        guest_id: guest(),
        vendor_id: item.vendor_id,
        menu_item_id: item.id,
        quantity,
        unit_price: item.price,
        total_price: item.price * quantity,
        status,
        order_id,
        created_at,
        updated_at: created_at,
    }
}

pub fn line_detail(line: CartLine) -> CartLineDetail {
    CartLineDetail { line, vendor_name: "Warung Bu Sri".into(), menu_item_name: "Nasi Goreng".into() }
}

pub fn order(id: i64, total: i64) -> Order {
    Order {
        id: OrderId(id),
        guest_id: guest(),
        buyer_name: "Alice".into(),
        seat: "A7".into(),
        notes: String::new(),
        email: "alice@example.com".into(),
        total_price: Rupiah::from(total),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 0).unwrap(),
    }
}

pub fn payment_record(order_id: i64, reference: &str, method: PaymentMethod, status: PaymentStatus) -> PaymentRecord {
    let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 5, 1).unwrap();
    let payment_data = match method {
        PaymentMethod::Cash => r#"{"key":"","qr":""}"#,
        PaymentMethod::Gopay => r#"{"key":"gojek://gopay/merchanttransfer","qr":"https://api.midtrans/qr"}"#,
        PaymentMethod::Qris => r#"{"key":"","qr":"https://api.midtrans/qr"}"#,
    };
    PaymentRecord {
        id: 1,
        order_id: OrderId(order_id),
        provider_transaction_id: format!("tx-{reference}"),
        provider_order_id: reference.to_string(),
        payment_method: method,
        gross_amount: Rupiah::from(20_000),
        status,
        payment_data: payment_data.to_string(),
        created_at,
        updated_at: created_at,
    }
}
