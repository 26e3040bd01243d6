use thiserror::Error;

/// Errors returned by storage backends.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Stored data could not be decoded: {0}")]
    DecodeError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => Self::DecodeError(e.to_string()),
            _ => Self::DatabaseError(e.to_string()),
        }
    }
}

/// Errors returned by [`super::PaymentProvider`] implementations.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Could not reach the payment provider: {0}")]
    Unreachable(String),
    #[error("The payment provider rejected the request: {0}")]
    Rejected(String),
    #[error("The payment provider sent a response we could not understand: {0}")]
    InvalidResponse(String),
}
