use std::str::FromStr;

use cucumber::{given, then, when};
use kantin_engine::{
    db_types::{BuyerInfo, CartLineStatus, GuestId, PaymentMethod, PaymentStatus, Rupiah},
    events::EventProducers,
    order_objects::CartLineQueryFilter,
    CartApi,
    CartManagement,
    FulfillmentApi,
    NotificationApi,
    OrderFlowError,
    PaymentRecordManagement,
};
use serde_json::json;

use crate::cucumber::{world::FoodCourt, KantinWorld};

fn guest(id: &str) -> GuestId {
    GuestId::from_str(id).expect("Invalid guest id")
}

#[given("a food court with the warung and the bakso stall")]
async fn food_court(world: &mut KantinWorld) {
    world.system = Some(FoodCourt::new().await);
}

#[when(expr = "guest {string} adds {int} {string} from {string}")]
async fn add_to_cart(world: &mut KantinWorld, guest_id: String, quantity: i64, item: String, vendor: String) {
    let court = world.court();
    let vendor = court.vendor(&vendor).id;
    let item = court.menu_item(&item).id;
    CartApi::new(court.db.clone())
        .add_item(&guest(&guest_id), vendor, item, quantity)
        .await
        .expect("Error adding item to cart");
}

#[then(expr = "guest {string} has {int} line(s) in their cart")]
async fn cart_size(world: &mut KantinWorld, guest_id: String, count: usize) {
    let lines = CartApi::new(world.court().db.clone()).list_active(&guest(&guest_id)).await.expect("Error listing cart");
    assert_eq!(lines.len(), count);
}

#[when(expr = "guest {string} checks out as {string} at seat {string} paying with {string}")]
async fn checkout(world: &mut KantinWorld, guest_id: String, name: String, seat: String, method: String) {
    let method = PaymentMethod::from_str(&method).expect("Unknown payment method");
    let court = world.court_mut();
    let result = court.payments().checkout_and_pay(&guest(&guest_id), &BuyerInfo::new(name, seat), method.id()).await;
    match result {
        Ok(receipt) => court.last_receipt = Some(receipt),
        Err(e) => court.last_error = Some(e),
    }
}

#[then("checkout fails because the cart is empty")]
async fn empty_cart(world: &mut KantinWorld) {
    let court = world.court();
    assert!(court.last_receipt.is_none());
    assert!(matches!(court.last_error, Some(OrderFlowError::EmptyCart(_))), "{:?}", court.last_error);
}

#[then(expr = "the order total is {int} rupiah")]
async fn order_total(world: &mut KantinWorld, total: i64) {
    assert_eq!(world.court().last_order().total_price, Rupiah::from(total));
}

#[then(expr = "the payment is {string}")]
async fn payment_status(world: &mut KantinWorld, status: String) {
    let court = world.court();
    let expected = PaymentStatus::from_str(&status).expect("Unknown payment status");
    let record = court
        .db
        .fetch_payment_record_for_order(court.last_order().id)
        .await
        .expect("Error fetching payment record")
        .expect("No payment record");
    assert_eq!(record.status, expected);
}

#[then("the payment has a QR code and a deep link")]
async fn payment_links(world: &mut KantinWorld) {
    let detail = world.court().payments().payment_detail(world.court().last_order().id).await.expect("No payment");
    assert!(!detail.action.qr.is_empty());
    assert!(!detail.action.key.is_empty());
}

#[when(expr = "the provider reports the payment as {string}")]
async fn provider_reports(world: &mut KantinWorld, status: String) {
    let court = world.court();
    let reference = court.last_receipt.as_ref().expect("No order has been placed").payment.provider_order_id.clone();
    court.provider.set_status(&reference, &status, None);
    let api = NotificationApi::new(court.db.clone(), court.provider.clone(), EventProducers::default());
    api.handle_notification(&json!({ "order_id": reference })).await.expect("Error handling notification");
}

#[when(expr = "{string} completes the order")]
async fn complete_order(world: &mut KantinWorld, vendor: String) {
    let court = world.court();
    let vendor = court.vendor(&vendor).id;
    FulfillmentApi::new(court.db.clone()).complete(court.last_order().id, vendor).await.expect("Error completing");
}

#[then(expr = "every line of the order is {string}")]
async fn line_statuses(world: &mut KantinWorld, status: String) {
    let court = world.court();
    let expected = CartLineStatus::from_str(&status).expect("Unknown line status");
    let filter = CartLineQueryFilter::default().with_order_id(court.last_order().id);
    let lines = court.db.fetch_cart_lines(filter).await.expect("Error fetching lines");
    assert!(!lines.is_empty());
    assert!(lines.iter().all(|l| l.status == expected), "{lines:?}");
}
