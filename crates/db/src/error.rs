//! Store failure type and its mapping onto the core taxonomy.

use portfolio_core::error::CoreError;

/// A failed call to the persistent store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),
}

/// Unique violations are split out so callers can report a conflict.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

/// Store failures are upstream failures, never "no data".
impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => CoreError::Conflict(msg),
            other => {
                tracing::error!(error = %other, "Store call failed");
                CoreError::Upstream(other.to_string())
            }
        }
    }
}
