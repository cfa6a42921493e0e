//! # Error Types
//!
//! Domain-specific error types for larder-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  larder-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  larder-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  larder-ledger errors                                                  │
//! │  └── LedgerError      - Closed set the caller matches on               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → LedgerError → caller    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::quantity::Quantity;
use crate::types::IngredientId;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A sale needs more of an ingredient than the location holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell 3 × Chicken Salad (0.150 kg chicken each)
    ///      │
    ///      ▼
    /// Validation pass: chicken on hand = 0.300 kg
    ///      │
    ///      ▼
    /// InsufficientInventory { ingredient: "Chicken", required: 0.450, available: 0.300 }
    ///      │
    ///      ▼
    /// Nothing was debited; UI shows the shortfall
    /// ```
    #[error("Insufficient inventory for {ingredient}: required {required}, available {available}")]
    InsufficientInventory {
        ingredient_id: IngredientId,
        ingredient: String,
        required: Quantity,
        available: Quantity,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any ledger transaction opens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. unparseable decimal, unknown movement type).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
