//! # Backend contracts
//!
//! The engine does not talk to SQLite or to Midtrans directly. Every component API is generic over one or more of the
//! traits defined here, and the concrete backends ([`crate::SqliteDatabase`] and the server's Midtrans integration)
//! implement them.
//!
//! * [`CatalogManagement`] looks up vendors and menu items. The catalog is read-only as far as the engine is concerned.
//! * [`CartManagement`] owns the merge-or-create upsert for cart lines and all line status transitions.
//! * [`OrderManagement`] converts a cart into an order in a single storage transaction.
//! * [`PaymentRecordManagement`] stores payment records and applies conditional status transitions.
//! * [`PaymentProvider`] is the external payment gateway.
mod cart_management;
mod catalog_management;
mod data_objects;
mod errors;
mod order_management;
mod payment_provider;
mod payment_record_management;

pub use cart_management::CartManagement;
pub use catalog_management::CatalogManagement;
pub use data_objects::{
    ChargeItem,
    CustomerContact,
    InsertPaymentResult,
    LineRemoval,
    ProviderAction,
    ProviderChargeRequest,
    ProviderChargeResponse,
    ProviderStatus,
};
pub use errors::{ProviderError, StorageError};
pub use order_management::OrderManagement;
pub use payment_provider::PaymentProvider;
pub use payment_record_management::PaymentRecordManagement;
