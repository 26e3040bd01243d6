//! # Kantin engine public API
//!
//! The `kpe_api` module exposes the programmatic API of the engine, one component per stage of an order's life:
//!
//! * [`cart_api`] manages a guest's active cart.
//! * [`checkout_api`] converts a cart into a priced, immutable order.
//! * [`payment_api`] charges orders, either in cash or through the payment provider.
//! * [`notification_api`] reconciles the provider's asynchronous notifications with our payment records.
//! * [`fulfillment_api`] lets vendors complete or cancel their lines of an order.
//! * [`order_query_api`] provides read-only views of orders for guests and vendors.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs. [`crate::SqliteDatabase`]
//! implements all the storage traits, so it can back every API:
//!
//! ```rust,ignore
//! use kantin_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/kantin.db", 25).await?;
//! let api = CartApi::new(db);
//! let line = api.add_item(&guest, VendorId(1), MenuItemId(4), 2).await?;
//! ```
pub mod cart_api;
pub mod checkout_api;
pub mod errors;
pub mod fulfillment_api;
pub mod notification_api;
pub mod order_objects;
pub mod order_query_api;
pub mod payment_api;
pub mod payment_objects;
