//! # larder-db: Database Layer for Larder
//!
//! This crate provides database access for the Larder inventory ledger.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Larder Data Flow                                 │
//! │                                                                         │
//! │  LedgerService::sell_item / ReportService::report_summary              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     larder-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Inventory     │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Movement      │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │ Recipe, ...   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use larder_db::{Database, DbConfig};
//!
//! // Create database (migrations run on connect)
//! let db = Database::new(DbConfig::new("path/to/larder.db")).await?;
//!
//! // Use repositories
//! let stock = db.inventory().list_for_location(location_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    IngredientRepository, InventoryRepository, LocationRepository, MenuItemRepository,
    MovementRepository, MovementTotals, NewIngredient, NewLocation, NewMenuItem, NewRecipe,
    NewRecipeLine, NewStaff, RecipeRepository, StaffRepository,
};
