//! # Repository Module
//!
//! Database repository implementations for Larder.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  Reads and reference-data CRUD go through a repository value that      │
//! │  owns a pool clone:                                                    │
//! │                                                                         │
//! │       db.inventory().list_for_location(location_id)                    │
//! │                                                                         │
//! │  Ledger writes go through associated functions that take the open      │
//! │  transaction's connection, so several repositories share one           │
//! │  atomic unit of work:                                                  │
//! │                                                                         │
//! │       let mut tx = db.begin().await?;                                  │
//! │       InventoryRepository::lock(&mut tx, loc, &[ing]).await?;          │
//! │       InventoryRepository::add_quantity(&mut tx, inv, qty).await?;     │
//! │       MovementRepository::insert(&mut tx, &movement).await?;           │
//! │       tx.commit().await?;                                              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`LocationRepository`] - Locations (logical delete)
//! - [`StaffRepository`] - Staff per location
//! - [`IngredientRepository`] - Ingredients and their running cost
//! - [`RecipeRepository`] - Recipes and their ingredient lines
//! - [`MenuItemRepository`] - Recipes priced at a location
//! - [`InventoryRepository`] - On-hand balances and the write lock
//! - [`MovementRepository`] - The append-only ledger and its aggregates

pub mod ingredient;
pub mod inventory;
pub mod location;
pub mod menu_item;
pub mod movement;
pub mod recipe;
pub mod staff;

pub use ingredient::{IngredientRepository, NewIngredient};
pub use inventory::InventoryRepository;
pub use location::{LocationRepository, NewLocation};
pub use menu_item::{MenuItemRepository, NewMenuItem};
pub use movement::{MovementRepository, MovementTotals};
pub use recipe::{NewRecipe, NewRecipeLine, RecipeRepository};
pub use staff::{NewStaff, StaffRepository};
