use std::fmt::Display;

use thiserror::Error;

use crate::{
    db_types::GuestId,
    traits::{ProviderError, StorageError},
};

/// Every error the component APIs can return.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Not allowed. {0}")]
    AuthorizationError(String),
    #[error("There is nothing in the cart for guest {0}")]
    EmptyCart(GuestId),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("Payment method {0} is not supported")]
    UnsupportedPaymentMethod(String),
    #[error("Payment data could not be read or written. {0}")]
    PaymentDataError(String),
    #[error("Malformed notification payload. {0}")]
    MalformedPayload(String),
    #[error("Payment status conflict. {0}")]
    ConsistencyConflict(String),
    #[error("Database error. {0}")]
    DatabaseError(String),
}

impl OrderFlowError {
    /// Wraps a storage failure, naming the operation and the key it was working on.
    pub fn storage<K: Display>(operation: &str, key: K, e: StorageError) -> Self {
        Self::DatabaseError(format!("{operation} failed for {key}. {e}"))
    }

    /// Wraps a payment provider failure, naming the operation and the key it was working on.
    pub fn provider<K: Display>(operation: &str, key: K, e: ProviderError) -> Self {
        Self::GatewayError(format!("{operation} failed for {key}. {e}"))
    }
}

impl From<StorageError> for OrderFlowError {
    fn from(e: StorageError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<ProviderError> for OrderFlowError {
    fn from(e: ProviderError) -> Self {
        Self::GatewayError(e.to_string())
    }
}
