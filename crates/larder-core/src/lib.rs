//! # larder-core: Pure Business Logic for Larder
//!
//! This crate holds the inventory ledger's domain model and arithmetic as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Larder Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 HTTP layer (outside this workspace)             │   │
//! │  │    routes ──► larder-cache (GET only) ──► services              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    larder-ledger                                │   │
//! │  │    LedgerService (deliveries, sales, counts), ReportService     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ larder-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  costing  │  │ validation│  │   │
//! │  │   │ Inventory │  │   Money   │  │  wtd avg  │  │   rules   │  │   │
//! │  │   │ Movement  │  │ Quantity  │  │  split    │  │  parsing  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    larder-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Inventory, InventoryMovement, Recipe, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`quantity`] - Fixed-point ingredient quantities
//! - [`costing`] - Weighted-average cost, valuation, revenue split
//! - [`error`] - Domain error types
//! - [`validation`] - Input rules and decimal parsing
//!
//! ## Example Usage
//!
//! ```rust
//! use larder_core::costing::{weighted_average_cost, CostUpdate};
//! use larder_core::{Money, Quantity};
//!
//! // 10 kg on hand at $5.00, 10 kg delivered at $7.00
//! let update = weighted_average_cost(
//!     Quantity::from_units(10),
//!     Money::from_cents(500),
//!     Quantity::from_units(10),
//!     Money::from_cents(700),
//! );
//!
//! assert_eq!(update, CostUpdate::Updated(Money::from_cents(600)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod costing;
pub mod error;
pub mod money;
pub mod quantity;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum portions in a single sale.
///
/// ## Business Reason
/// Catches accidental over-entry (typing 1000 instead of 10) before it
/// drains a location's stock.
pub const MAX_SALE_PORTIONS: i64 = 999;

/// Maximum length of names (locations, staff, ingredients, recipes).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of free-form movement notes.
pub const MAX_NOTES_LEN: usize = 500;

/// Maximum length of a movement reference (invoice number, recipe id).
pub const MAX_REFERENCE_LEN: usize = 100;
