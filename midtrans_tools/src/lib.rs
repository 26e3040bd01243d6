//! A thin client for the Midtrans Core API.
//!
//! Only the two calls the payment gateway needs are covered: creating a charge and querying the status of a
//! transaction. Notification payloads are modelled in [`data_objects`] so that the signature can be checked before the
//! payload is handed on.
mod api;
mod config;
mod error;

pub mod data_objects;
pub mod helpers;

pub use api::MidtransApi;
pub use config::{MidtransConfig, MidtransEnvironment};
pub use data_objects::{
    ChargeRequest,
    ChargeResponse,
    CustomerDetails,
    ItemDetails,
    NotificationSignatureFields,
    PaymentAction,
    TransactionDetails,
    TransactionStatusResponse,
};
pub use error::MidtransApiError;
