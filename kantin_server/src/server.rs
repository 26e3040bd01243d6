use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use kantin_engine::{
    events::EventProducers,
    CartApi,
    FulfillmentApi,
    NotificationApi,
    OrderQueryApi,
    PaymentApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{kitchen::create_kitchen_event_handlers, midtrans::MidtransProvider},
    middleware::SignatureMiddlewareFactory,
    routes::{
        health,
        AddToCartRoute,
        CancelOrderRoute,
        CheckoutRoute,
        CompleteOrderRoute,
        MidtransNotificationRoute,
        MyCartRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PayForOrderRoute,
        PaymentStatusRoute,
        RemoveFromCartRoute,
        VendorOrdersRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Database is ready at {}", db.url());
    let provider = MidtransProvider::try_from_config(config.midtrans.clone())?;
    let handlers = create_kitchen_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let srv = create_server_instance(config, db, provider, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    provider: MidtransProvider,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let cart_api = CartApi::new(db.clone());
        let payment_api = PaymentApi::new(db.clone(), provider.clone(), config.payment.clone());
        let notification_api = NotificationApi::new(db.clone(), provider.clone(), producers.clone())
            .with_provider_timeout(config.payment.provider_timeout);
        let fulfillment_api = FulfillmentApi::new(db.clone());
        let order_query_api = OrderQueryApi::new(db.clone());
        let api_scope = web::scope("/api")
            .service(MyCartRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new())
            .service(CheckoutRoute::<SqliteDatabase, MidtransProvider>::new())
            .service(PayForOrderRoute::<SqliteDatabase, MidtransProvider>::new())
            .service(MyOrdersRoute::<SqliteDatabase>::new())
            .service(OrderByIdRoute::<SqliteDatabase>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, MidtransProvider>::new())
            .service(VendorOrdersRoute::<SqliteDatabase>::new())
            .service(CompleteOrderRoute::<SqliteDatabase>::new())
            .service(CancelOrderRoute::<SqliteDatabase>::new());
        let midtrans_scope = web::scope("/midtrans")
            .wrap(SignatureMiddlewareFactory::new(config.midtrans.server_key.clone(), config.signature_checks))
            .service(MidtransNotificationRoute::<SqliteDatabase, MidtransProvider>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("kantin::access_log"))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(payment_api))
            .app_data(web::Data::new(notification_api))
            .app_data(web::Data::new(fulfillment_api))
            .app_data(web::Data::new(order_query_api))
            .service(health)
            .service(api_scope)
            .service(midtrans_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
