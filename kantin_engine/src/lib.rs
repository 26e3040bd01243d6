//! Kantin Engine
//!
//! The Kantin engine is the core of a food court ordering system. Guests fill a cart from the menus of several vendors,
//! check out into a single order, and pay in cash or through the Midtrans payment gateway. Payment outcomes arrive
//! asynchronously as webhook notifications and are reconciled against our records.
//!
//! The library is divided into three main sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite implementation of the storage traits ([`SqliteDatabase`]). You
//!    should never need to access the database directly. The exception is the data types used in the database. These
//!    are defined in the `db_types` module and are public.
//! 2. The engine's public API (`kpe_api`). Each component (cart, checkout, payment, notifications, fulfillment and
//!    order queries) is a separate struct that is generic over the backend traits it needs.
//! 3. Events ([`mod@events`]). Hooks can be registered to react when an order is paid or annulled.
mod db;

pub mod db_types;
pub mod events;
mod kpe_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use kpe_api::{
    cart_api::CartApi,
    checkout_api::CheckoutApi,
    errors::OrderFlowError,
    fulfillment_api::FulfillmentApi,
    notification_api::NotificationApi,
    order_objects,
    order_query_api::{OrderQueryApi, RECENT_ORDER_LIMIT, VENDOR_QUEUE_STATUSES},
    payment_api::{extract_payment_action, PaymentApi},
    payment_objects,
};
pub use traits::{
    CartManagement,
    CatalogManagement,
    OrderManagement,
    PaymentProvider,
    PaymentRecordManagement,
    ProviderError,
    StorageError,
};
