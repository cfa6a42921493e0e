//! # Domain Types
//!
//! Core domain types used throughout Larder.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Reference data (logical delete via is_active)                         │
//! │  ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌──────────────┐     │
//! │  │ Location  │◄──│  Staff    │   │ Ingredient │◄──│ RecipeIngr.  │     │
//! │  └─────┬─────┘   └───────────┘   │ cost_cents │   │ quantity     │     │
//! │        │                         └─────┬──────┘   └──────┬───────┘     │
//! │        │         ┌───────────┐         │          ┌──────┴───────┐     │
//! │        └────────►│ MenuItem  │────────────────────►│   Recipe     │     │
//! │                  │ price     │         │          └──────────────┘     │
//! │                  └───────────┘         │                               │
//! │                                        ▼                               │
//! │  Ledger state                  ┌──────────────┐                        │
//! │                                │  Inventory   │ one row per            │
//! │                                │  quantity    │ (location, ingredient) │
//! │                                └──────┬───────┘                        │
//! │                                       │ Σ deltas                       │
//! │                                ┌──────┴────────────┐                   │
//! │                                │ InventoryMovement │ append-only       │
//! │                                └───────────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage Shape
//! Entities keep the raw integer columns (`cost_cents`, `quantity_milli`)
//! so they map straight onto rows, and expose typed accessors
//! (`cost() -> Money`, `quantity() -> Quantity`) for arithmetic.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Identifiers
// =============================================================================

pub type LocationId = i64;
pub type StaffId = i64;
pub type IngredientId = i64;
pub type RecipeId = i64;
pub type MenuItemId = i64;
pub type MovementId = i64;

// =============================================================================
// Reference Data
// =============================================================================

/// A restaurant location. Every inventory row and movement belongs to one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
}

/// A staff member; the actor recorded on every movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Staff {
    pub id: StaffId,
    pub location_id: LocationId,
    pub name: String,
    pub role: Option<String>,
    pub is_active: bool,
}

/// An ingredient with its running weighted-average unit cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub description: Option<String>,

    /// Cost of one whole unit, in cents. Rewritten by every costed delivery.
    pub cost_cents: i64,

    /// Unit of measure ("kg", "L", "ea").
    pub unit: Option<String>,
    pub is_active: bool,
}

impl Ingredient {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// One bill-of-materials line: how much of an ingredient one portion uses.
///
/// Lines are always read joined with the ingredient so the name is at hand
/// for insufficient-stock messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,

    /// Quantity per portion in milli-units. Zero marks an optional garnish.
    pub quantity_milli: i64,
}

impl RecipeIngredient {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }
}

/// A recipe offered for sale at one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub location_id: LocationId,
    pub recipe_id: RecipeId,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
}

impl MenuItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Ledger State
// =============================================================================

/// On-hand balance for one (location, ingredient) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Inventory {
    pub id: i64,
    pub location_id: LocationId,
    pub ingredient_id: IngredientId,
    pub quantity_milli: i64,
    pub unit: Option<String>,
}

impl Inventory {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }
}

/// An inventory row joined with its ingredient, as shown on stock screens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub inventory_id: i64,
    pub location_id: LocationId,
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub unit: Option<String>,
    pub quantity_milli: i64,
    pub cost_cents: i64,
}

impl InventoryItem {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// On-hand value at the current weighted-average cost.
    pub fn value(&self) -> Money {
        crate::costing::inventory_value(self.quantity(), self.cost())
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// The kind of ledger entry.
///
/// ```text
/// delivery    +qty   cost = delivered unit cost
/// sale        -qty   revenue = share of menu price × portions
/// waste       -qty   cost = |qty| × ingredient cost
/// adjustment  ≥0     no cost, no revenue
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    Delivery,
    Sale,
    Waste,
    Adjustment,
}

impl MovementType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementType::Delivery => "delivery",
            MovementType::Sale => "sale",
            MovementType::Waste => "waste",
            MovementType::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delivery" => Ok(MovementType::Delivery),
            "sale" => Ok(MovementType::Sale),
            "waste" => Ok(MovementType::Waste),
            "adjustment" => Ok(MovementType::Adjustment),
            other => Err(ValidationError::InvalidFormat {
                field: "type".to_string(),
                reason: format!("unknown movement type '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryMovement {
    pub id: MovementId,
    pub location_id: LocationId,
    pub staff_id: StaffId,
    pub ingredient_id: IngredientId,

    /// Signed delta in milli-units.
    pub quantity_milli: i64,
    pub movement_type: MovementType,

    /// Free-form reference (invoice number, recipe id).
    pub reference: Option<String>,
    pub cost_cents: Option<i64>,
    pub revenue_cents: Option<i64>,
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

impl InventoryMovement {
    #[inline]
    pub fn quantity(&self) -> Quantity {
        Quantity::from_milli(self.quantity_milli)
    }

    #[inline]
    pub fn cost(&self) -> Option<Money> {
        self.cost_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn revenue(&self) -> Option<Money> {
        self.revenue_cents.map(Money::from_cents)
    }
}

/// A movement joined with the names a history screen needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MovementView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub movement: InventoryMovement,
    pub ingredient_name: String,
    pub staff_name: String,
}

/// Input for appending a movement. Built only by ledger operations.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    pub location_id: LocationId,
    pub staff_id: StaffId,
    pub ingredient_id: IngredientId,
    pub quantity: Quantity,
    pub movement_type: MovementType,
    pub reference: Option<String>,
    pub cost: Option<Money>,
    pub revenue: Option<Money>,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

// =============================================================================
// Reporting Types
// =============================================================================

/// Optional bounds for movement queries. Both date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MovementFilter {
    #[ts(as = "Option<String>")]
    pub start: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub end: Option<DateTime<Utc>>,
    pub movement_type: Option<MovementType>,
}

impl MovementFilter {
    /// No bounds: every movement of the location.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whole calendar days, UTC: from the start of `first` to the last
    /// instant of `last`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use larder_core::MovementFilter;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let filter = MovementFilter::for_days(day, day);
    /// assert!(filter.start < filter.end);
    /// ```
    pub fn for_days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&first.and_time(NaiveTime::MIN));
        let last_instant =
            NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
        let end = Utc.from_utc_datetime(&last.and_time(last_instant));
        Self {
            start: Some(start),
            end: Some(end),
            movement_type: None,
        }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            movement_type: None,
        }
    }

    pub fn with_type(mut self, movement_type: MovementType) -> Self {
        self.movement_type = Some(movement_type);
        self
    }
}

/// Cost and revenue totals for a location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportSummary {
    /// Σ cost of delivery movements in range.
    pub total_delivery_cost: Money,
    /// Σ revenue of sale movements in range.
    pub total_sales_revenue: Money,
    /// Σ cost of waste movements in range.
    pub total_waste_cost: Money,
    /// Σ quantity × cost over current inventory, never date-filtered.
    pub total_inventory_value: Money,
}

/// An ingredient's on-hand balance next to the sum of its movements.
///
/// The two must always agree; reconciliation reports the rows that don't.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LedgerBalance {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    pub on_hand_milli: i64,
    pub ledger_milli: i64,
}

impl LedgerBalance {
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.on_hand_milli == self.ledger_milli
    }

    /// `on_hand - ledger`; zero when consistent.
    pub fn drift(&self) -> Quantity {
        Quantity::from_milli(self.on_hand_milli.saturating_sub(self.ledger_milli))
    }
}
