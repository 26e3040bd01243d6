use thiserror::Error;

use crate::traits::StorageError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Database query error: {0}")]
    QueryError(String),
}

impl From<SqliteDatabaseError> for StorageError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DriverError(e) => e.into(),
            SqliteDatabaseError::QueryError(s) => StorageError::QueryError(s),
            e => StorageError::DatabaseError(e.to_string()),
        }
    }
}
