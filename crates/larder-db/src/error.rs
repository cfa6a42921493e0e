//! # Store Errors
//!
//! Every sqlx failure is classified once, here, by the SQLite message it
//! carries. Callers above this crate never match on `sqlx::Error`.
//!
//! ```text
//! "UNIQUE constraint failed: inventory.location_id, ..."  → UniqueViolation
//! "FOREIGN KEY constraint failed"                          → ForeignKeyViolation
//! "CHECK constraint failed: cost_cents >= 0"               → CheckViolation
//! "database is locked"                                     → Busy
//! "inventory movements are append-only"                    → QueryFailed
//! pool acquire timed out                                   → PoolExhausted
//! ```

use larder_core::ValidationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// A row looked up by key does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Provisioning the same (location, ingredient) twice, for example.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A movement, recipe line or menu item references a missing row.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Negative cost or price, negative recipe quantity, unknown movement type.
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// Another writer held the database lock past the busy timeout.
    #[error("Database is busy")]
    Busy,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected the statement for a reason not classified above.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No pooled connection became free within the connect timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether retrying the same operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DbError::Busy | DbError::PoolExhausted)
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("database is locked") {
                    DbError::Busy
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Reference data rejected before it reaches SQLite.
impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::CheckViolation {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_retryable() {
        assert!(DbError::Busy.is_retryable());
        assert!(DbError::PoolExhausted.is_retryable());
        assert!(!DbError::not_found("Ingredient", 7).is_retryable());
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            DbError::not_found("Ingredient", 7).to_string(),
            "Ingredient not found: 7"
        );
    }
}
