//! Database error types
//!
//! This module defines the error types that can occur during database operations,
//! and the combined error returned by the transactional ledger services.

use thiserror::Error;
use tracing::warn;

use domain_billing::{BillingError, ErrorKind};

/// Errors that can occur during database operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to establish a database connection
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Entity not found in database
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A value does not fit its column
    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    /// A table the query needs has not been created yet
    #[error("Schema not provisioned: {0}")]
    SchemaMissing(String),

    /// Lock wait gave up or the transaction was chosen as a deadlock victim
    #[error("Lock not acquired: {0}")]
    LockFailed(String),

    /// Transaction error
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Migration error
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// A stored value could not be mapped to its domain type
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Pool exhaustion - no available connections
    #[error("Connection pool exhausted")]
    PoolExhausted,
}

impl DatabaseError {
    /// Creates a not found error for a specific entity type and identifier
    ///
    /// # Example
    ///
    /// ```rust
    /// use infra_db::DatabaseError;
    ///
    /// let error = DatabaseError::not_found("Invoice", "INV-123");
    /// assert!(error.to_string().contains("Invoice"));
    /// ```
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        DatabaseError::NotFound(format!("{} with id '{}' not found", entity, id))
    }
}

/// Converts SQLx errors to more specific DatabaseError variants
/// based on the PostgreSQL error code.
impl From<&sqlx::Error> for DatabaseError {
    fn from(error: &sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => {
                DatabaseError::NotFound("Record not found".to_string())
            }
            sqlx::Error::PoolTimedOut => DatabaseError::PoolExhausted,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DatabaseError::SerializationError(error.to_string())
            }
            sqlx::Error::Database(db_err) => {
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                let message = db_err.message().to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DatabaseError::DuplicateEntry(message),
                    Some("23503") => DatabaseError::ForeignKeyViolation(message),
                    Some("23514") => DatabaseError::ConstraintViolation(message),
                    Some("22003") => DatabaseError::ValueOutOfRange(message),
                    Some("42P01") => DatabaseError::SchemaMissing(message),
                    Some("55P03") | Some("40P01") => DatabaseError::LockFailed(message),
                    _ => DatabaseError::QueryFailed(message),
                }
            }
            _ => DatabaseError::QueryFailed(error.to_string()),
        }
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(error: sqlx::Error) -> Self {
        DatabaseError::from(&error)
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(error.to_string())
    }
}

/// Treats a missing table as an empty result on read paths
pub fn empty_if_unprovisioned<T>(
    result: Result<Vec<T>, DatabaseError>,
) -> Result<Vec<T>, DatabaseError> {
    match result {
        Err(DatabaseError::SchemaMissing(message)) => {
            warn!(%message, "Schema not provisioned, returning empty result");
            Ok(Vec::new())
        }
        other => other,
    }
}

/// Errors returned by the transactional ledger services
///
/// Business rule rejections and storage failures stay distinct so the
/// API layer can map the former to client errors.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl LedgerError {
    /// Business classification, `None` for storage failures
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            LedgerError::Billing(err) => Some(err.kind()),
            LedgerError::Database(DatabaseError::NotFound(_)) => Some(ErrorKind::NotFound),
            LedgerError::Database(DatabaseError::ValueOutOfRange(_)) => Some(ErrorKind::Validation),
            LedgerError::Database(_) => None,
        }
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(error: sqlx::Error) -> Self {
        LedgerError::Database(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = DatabaseError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[test]
    fn test_pool_timeout_is_pool_exhausted() {
        let err = DatabaseError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DatabaseError::PoolExhausted));
    }

    #[test]
    fn test_empty_if_unprovisioned() {
        let missing: Result<Vec<i32>, _> =
            Err(DatabaseError::SchemaMissing("relation \"invoices\" does not exist".into()));
        assert_eq!(empty_if_unprovisioned(missing).unwrap(), Vec::<i32>::new());

        let failed: Result<Vec<i32>, _> = Err(DatabaseError::QueryFailed("boom".into()));
        assert!(empty_if_unprovisioned(failed).is_err());
    }

    #[test]
    fn test_ledger_error_kind() {
        let err = LedgerError::from(BillingError::AlreadyPaid("INV-1".into()));
        assert_eq!(err.kind(), Some(ErrorKind::Conflict));

        let err = LedgerError::from(DatabaseError::PoolExhausted);
        assert_eq!(err.kind(), None);

        let err = LedgerError::from(DatabaseError::ValueOutOfRange("numeric field overflow".into()));
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
    }
}
