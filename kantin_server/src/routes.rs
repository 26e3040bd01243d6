//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Anything that waits on I/O (the database, Midtrans) must be awaited,
//! never blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use kantin_engine::{
    db_types::{OrderId, VendorId},
    payment_objects::NotificationOutcome,
    traits::LineRemoval,
    CartApi,
    CartManagement,
    CatalogManagement,
    FulfillmentApi,
    NotificationApi,
    OrderFlowError,
    OrderManagement,
    OrderQueryApi,
    PaymentApi,
    PaymentProvider,
    PaymentRecordManagement,
};
use log::*;
use serde_json::Value;

use crate::{
    data_objects::{
        AddItemRequest,
        CheckoutRequest,
        FulfillmentResponse,
        NotificationAck,
        PayRequest,
        RemovalResponse,
        VendorOrdersQuery,
    },
    errors::ServerError,
    helpers::Guest,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:path),+ ; provider impl $pbound:path) => {
        paste::paste! { pub struct [<$name:camel Route>]<B, P>(core::marker::PhantomData<fn() -> (B, P)>);}
        paste::paste! { impl<B, P> [<$name:camel Route>]<B, P> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> (B, P)>)
            }
        }}
        paste::paste! { impl<B, P> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B, P>
        where
            B: $($bounds +)+ 'static,
            P: $pbound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B, P>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:path),+) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(my_cart => Get "/cart" impl CatalogManagement, CartManagement);
/// The lines in the guest's active cart, with vendor and menu item names.
pub async fn my_cart<B>(guest: Guest, api: web::Data<CartApi<B>>) -> Result<HttpResponse, ServerError>
where B: CatalogManagement + CartManagement {
    trace!("💻️ Cart request for {}", guest.0);
    let lines = api.list_active(&guest.0).await?;
    Ok(HttpResponse::Ok().json(lines))
}

route!(add_to_cart => Post "/cart" impl CatalogManagement, CartManagement);
pub async fn add_to_cart<B>(
    guest: Guest,
    body: web::Json<AddItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + CartManagement,
{
    let AddItemRequest { vendor_id, menu_item_id, quantity } = body.into_inner();
    debug!("💻️ {} adds {quantity} x {menu_item_id} from {vendor_id}", guest.0);
    let line = api.add_item(&guest.0, vendor_id, menu_item_id, quantity).await?;
    Ok(HttpResponse::Ok().json(line))
}

route!(remove_from_cart => Delete "/cart/{line_id}" impl CatalogManagement, CartManagement);
/// Takes one unit off a cart line. The line is deleted along with its last unit.
pub async fn remove_from_cart<B>(
    guest: Guest,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: CatalogManagement + CartManagement,
{
    let line_id = path.into_inner();
    debug!("💻️ {} removes one unit from cart line #{line_id}", guest.0);
    let response = match api.remove_one_unit(&guest.0, line_id).await? {
        LineRemoval::Decremented(line) => RemovalResponse { line_id, deleted: false, line: Some(line) },
        LineRemoval::Deleted(_) => RemovalResponse { line_id, deleted: true, line: None },
        LineRemoval::NotInCart => {
            return Err(OrderFlowError::ValidationError(format!("Cart line #{line_id} is not in the cart")).into())
        },
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Checkout & payment  ---------------------------------------------
route!(checkout => Post "/checkout" impl OrderManagement, CartManagement, PaymentRecordManagement; provider impl PaymentProvider);
/// Converts the guest's cart into an order and starts paying for it with the chosen method.
pub async fn checkout<B, P>(
    guest: Guest,
    body: web::Json<CheckoutRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + CartManagement + PaymentRecordManagement,
    P: PaymentProvider,
{
    let CheckoutRequest { buyer, payment_method } = body.into_inner();
    debug!("💻️ Checkout request from {} (payment method #{payment_method})", guest.0);
    let receipt = api.checkout_and_pay(&guest.0, &buyer, payment_method).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

route!(pay_for_order => Post "/orders/{order_id}/pay" impl OrderManagement, CartManagement, PaymentRecordManagement; provider impl PaymentProvider);
/// Starts payment for an order that has none yet, e.g. after the provider timed out during checkout.
pub async fn pay_for_order<B, P>(
    guest: Guest,
    path: web::Path<i64>,
    body: web::Json<PayRequest>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + CartManagement + PaymentRecordManagement,
    P: PaymentProvider,
{
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ {} asks to pay for order {order_id}", guest.0);
    let record = api.pay_for_order(&guest.0, order_id, body.payment_method).await?;
    let detail = api.payment_detail(record.order_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

route!(payment_status => Get "/payments/{order_id}" impl OrderManagement, CartManagement, PaymentRecordManagement; provider impl PaymentProvider);
pub async fn payment_status<B, P>(
    path: web::Path<i64>,
    api: web::Data<PaymentApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + CartManagement + PaymentRecordManagement,
    P: PaymentProvider,
{
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ Payment status request for order {order_id}");
    let detail = api.payment_detail(order_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/orders" impl OrderManagement, CartManagement, PaymentRecordManagement);
pub async fn my_orders<B>(guest: Guest, api: web::Data<OrderQueryApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + CartManagement + PaymentRecordManagement {
    trace!("💻️ Order history request for {}", guest.0);
    let orders = api.orders_for_guest(&guest.0).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl OrderManagement, CartManagement, PaymentRecordManagement);
pub async fn order_by_id<B>(path: web::Path<i64>, api: web::Data<OrderQueryApi<B>>) -> Result<HttpResponse, ServerError>
where B: OrderManagement + CartManagement + PaymentRecordManagement {
    let order_id = OrderId::from(path.into_inner());
    trace!("💻️ Order request for {order_id}");
    let detail = api.order_detail(order_id).await?;
    Ok(HttpResponse::Ok().json(detail))
}

//----------------------------------------------   Fulfillment  ----------------------------------------------------
route!(vendor_orders => Get "/vendors/{vendor_id}/orders" impl OrderManagement, CartManagement, PaymentRecordManagement, CatalogManagement);
/// The vendor's orders, filtered by line status with `?status=paid,done`. Paid lines are shown when no status is given.
pub async fn vendor_orders<B>(
    path: web::Path<i64>,
    query: web::Query<VendorOrdersQuery>,
    api: web::Data<OrderQueryApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + CartManagement + PaymentRecordManagement + CatalogManagement,
{
    let vendor_id = VendorId::from(path.into_inner());
    let statuses = query.statuses().map_err(|e| OrderFlowError::ValidationError(e.to_string()))?;
    trace!("💻️ Order list request for {vendor_id}");
    let orders = api.orders_for_vendor(vendor_id, &statuses).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(complete_order => Post "/vendors/{vendor_id}/orders/{order_id}/complete" impl OrderManagement, CartManagement);
/// Marks the vendor's paid lines in the order as handed over.
pub async fn complete_order<B>(
    path: web::Path<(i64, i64)>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + CartManagement,
{
    let (vendor_id, order_id) = path.into_inner();
    let (vendor_id, order_id) = (VendorId::from(vendor_id), OrderId::from(order_id));
    debug!("💻️ {vendor_id} completes order {order_id}");
    let lines_updated = api.complete(order_id, vendor_id).await?;
    Ok(HttpResponse::Ok().json(FulfillmentResponse { order_id, vendor_id, lines_updated }))
}

route!(cancel_order => Post "/vendors/{vendor_id}/orders/{order_id}/cancel" impl OrderManagement, CartManagement);
/// Cancels all of the vendor's lines in the order.
pub async fn cancel_order<B>(
    path: web::Path<(i64, i64)>,
    api: web::Data<FulfillmentApi<B>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + CartManagement,
{
    let (vendor_id, order_id) = path.into_inner();
    let (vendor_id, order_id) = (VendorId::from(vendor_id), OrderId::from(order_id));
    debug!("💻️ {vendor_id} cancels order {order_id}");
    let lines_updated = api.cancel(order_id, vendor_id).await?;
    Ok(HttpResponse::Ok().json(FulfillmentResponse { order_id, vendor_id, lines_updated }))
}

//----------------------------------------------   Midtrans  ----------------------------------------------------
route!(midtrans_notification => Post "/notification" impl OrderManagement, PaymentRecordManagement; provider impl PaymentProvider);
/// Receives Midtrans payment notifications.
///
/// A 2xx response tells Midtrans to stop redelivering, so it is only sent once the notification has been dealt with:
/// the record was updated, or there was nothing to do. Conflicts are acknowledged with `success: false`, since
/// redelivery would not resolve them. Gateway and storage failures return an error so that Midtrans tries again.
pub async fn midtrans_notification<B, P>(
    body: web::Json<Value>,
    api: web::Data<NotificationApi<B, P>>,
) -> Result<HttpResponse, ServerError>
where
    B: OrderManagement + PaymentRecordManagement,
    P: PaymentProvider,
{
    trace!("💻️ Midtrans notification received");
    let ack = match api.handle_notification(&body).await {
        Ok(outcome) => {
            let message = match &outcome {
                NotificationOutcome::Updated { previous, record } => {
                    format!("Payment moved from {previous} to {}", record.status)
                },
                NotificationOutcome::Unchanged(_) => "Payment status unchanged".to_string(),
                NotificationOutcome::Stale(_) => "Stale notification ignored".to_string(),
                NotificationOutcome::Unrecognised(_) => "Unrecognised status ignored".to_string(),
            };
            NotificationAck { success: true, message, status: Some(outcome.record().status) }
        },
        Err(OrderFlowError::ConsistencyConflict(message)) => {
            warn!("💻️ Acknowledging conflicting notification. {message}");
            NotificationAck { success: false, message, status: None }
        },
        Err(e) => return Err(e.into()),
    };
    Ok(HttpResponse::Ok().json(ack))
}
