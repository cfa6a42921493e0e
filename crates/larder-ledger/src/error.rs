//! # Ledger Error Types
//!
//! The closed set of failures a ledger or report call can return.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Ledger Error Categories                           │
//! │                                                                         │
//! │  OPERATIONAL (expected, shown to the user as-is)                       │
//! │  ┌─────────────────┐  ┌───────────────────────┐  ┌─────────────────┐   │
//! │  │ NotFound        │  │ InsufficientInventory │  │ InvalidInput    │   │
//! │  │ no menu item,   │  │ ingredient, required, │  │ quantity <= 0,  │   │
//! │  │ no inventory row│  │ available             │  │ negative cost   │   │
//! │  └─────────────────┘  └───────────────────────┘  └─────────────────┘   │
//! │  ┌─────────────────┐                                                    │
//! │  │ InvalidState    │                                                    │
//! │  │ recipe with no  │                                                    │
//! │  │ usable lines    │                                                    │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  UNEXPECTED (logged in full, shown as a generic message)               │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │ Database(DbError) - the transaction was rolled back             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers dispatch on [`LedgerError::kind`], which serializes as a
//! `SCREAMING_SNAKE_CASE` code:
//! ```json
//! { "code": "INSUFFICIENT_INVENTORY", "message": "Insufficient inventory for Chicken: ..." }
//! ```

use serde::Serialize;
use thiserror::Error;

use larder_core::{CoreError, IngredientId, Quantity, ValidationError};
use larder_db::DbError;

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Message shown for store failures instead of their details.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced entity or relationship does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// A sale needs more stock than the location holds. Nothing was debited.
    #[error("Insufficient inventory for {ingredient}: required {required}, available {available}")]
    InsufficientInventory {
        ingredient_id: IngredientId,
        ingredient: String,
        required: Quantity,
        available: Quantity,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// The stored data cannot support the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InsufficientInventory,
    InvalidInput,
    InvalidState,
    DatabaseError,
}

impl ErrorKind {
    /// HTTP status the API layer maps this kind to.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::InvalidInput => 400,
            ErrorKind::InsufficientInventory | ErrorKind::InvalidState => 422,
            ErrorKind::DatabaseError => 500,
        }
    }
}

/// What the caller sends back to a client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: ErrorKind,
    pub message: String,
}

impl LedgerError {
    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::InsufficientInventory { .. } => ErrorKind::InsufficientInventory,
            LedgerError::InvalidInput(_) => ErrorKind::InvalidInput,
            LedgerError::InvalidState(_) => ErrorKind::InvalidState,
            LedgerError::Database(_) => ErrorKind::DatabaseError,
        }
    }

    /// Expected failures that carry a user-facing message.
    pub fn is_operational(&self) -> bool {
        !matches!(self, LedgerError::Database(_))
    }

    /// True when retrying the whole operation may succeed (lock contention).
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Database(err) if err.is_retryable())
    }

    /// The message safe to show a client. Store details are withheld.
    pub fn public_message(&self) -> String {
        if self.is_operational() {
            self.to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        }
    }

    /// Converts to a response body, logging unexpected failures in full.
    pub fn to_body(&self) -> ErrorBody {
        if !self.is_operational() {
            tracing::error!(error = %self, "Ledger operation failed");
        }
        ErrorBody {
            code: self.kind(),
            message: self.public_message(),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::NotFound { entity, key: id },
            // Every foreign key in the schema points at a reference entity
            // (location, staff, ingredient, recipe).
            DbError::ForeignKeyViolation { message } => LedgerError::NotFound {
                entity: "Referenced entity".to_string(),
                key: message,
            },
            other => LedgerError::Database(other),
        }
    }
}

impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientInventory {
                ingredient_id,
                ingredient,
                required,
                available,
            } => LedgerError::InsufficientInventory {
                ingredient_id,
                ingredient,
                required,
                available,
            },
            CoreError::Validation(err) => LedgerError::InvalidInput(err),
        }
    }
}
