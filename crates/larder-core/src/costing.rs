//! # Costing Engine
//!
//! Pure arithmetic behind the ledger: weighted-average cost on delivery,
//! valuation of stock and waste, revenue splitting, and stock-count
//! classification.
//!
//! ## Weighted Average on Delivery
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  on hand:  10.000 kg @ $5.00    (value $50.00)                          │
//! │  delivery: 10.000 kg @ $7.00    (value $70.00)                          │
//! │                                                                         │
//! │            50.00 + 70.00                                                │
//! │  new cost = ─────────────  = $6.00 / kg                                 │
//! │              10 + 10                                                    │
//! │                                                                         │
//! │  Skipped (cost unchanged) when the delivery has no quantity or no      │
//! │  cost. A zero or negative on-hand balance contributes no value, so     │
//! │  the new cost is simply the delivered cost.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All divisions go through one rounding rule (half away from zero, to the
//! cent) with i128 intermediates.

use serde::{Deserialize, Serialize};

use crate::money::{div_round_half_away, Money};
use crate::quantity::{Quantity, MILLI_PER_UNIT};
use crate::types::MovementType;

// =============================================================================
// Weighted Average
// =============================================================================

/// Result of costing a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostUpdate {
    /// Keep the ingredient's current cost.
    Unchanged,
    /// Persist this new unit cost.
    Updated(Money),
}

impl CostUpdate {
    /// The cost the ingredient ends up with.
    pub fn resolve(self, current: Money) -> Money {
        match self {
            CostUpdate::Unchanged => current,
            CostUpdate::Updated(cost) => cost,
        }
    }
}

/// Computes the ingredient's unit cost after a delivery.
///
/// ## Arguments
/// * `existing_qty` - on-hand quantity before the delivery
/// * `existing_cost` - current unit cost of the ingredient
/// * `delivered_qty` - quantity received
/// * `delivered_cost` - unit cost of the delivery
///
/// ## Example
/// ```rust
/// use larder_core::costing::{weighted_average_cost, CostUpdate};
/// use larder_core::{Money, Quantity};
///
/// let update = weighted_average_cost(
///     Quantity::from_units(10),
///     Money::from_cents(500),
///     Quantity::from_units(10),
///     Money::from_cents(700),
/// );
/// assert_eq!(update, CostUpdate::Updated(Money::from_cents(600)));
/// ```
pub fn weighted_average_cost(
    existing_qty: Quantity,
    existing_cost: Money,
    delivered_qty: Quantity,
    delivered_cost: Money,
) -> CostUpdate {
    if !delivered_qty.is_positive() || !delivered_cost.is_positive() {
        return CostUpdate::Unchanged;
    }

    let on_hand = existing_qty.milli().max(0) as i128;
    if on_hand == 0 {
        return CostUpdate::Updated(delivered_cost);
    }

    let received = delivered_qty.milli() as i128;
    let total_value =
        on_hand * existing_cost.cents() as i128 + received * delivered_cost.cents() as i128;
    let cost = div_round_half_away(total_value, on_hand + received);

    CostUpdate::Updated(Money::from_cents(saturate(cost)))
}

// =============================================================================
// Valuation
// =============================================================================

/// Value of a quantity at a unit cost, rounded to the cent.
///
/// Negative quantities produce negative values.
pub fn inventory_value(quantity: Quantity, unit_cost: Money) -> Money {
    let value = div_round_half_away(
        quantity.milli() as i128 * unit_cost.cents() as i128,
        MILLI_PER_UNIT as i128,
    );
    Money::from_cents(saturate(value))
}

/// Value of lost stock: `|quantity| × unit_cost`, always non-negative for a
/// non-negative cost.
pub fn waste_value(quantity: Quantity, unit_cost: Money) -> Money {
    inventory_value(quantity.abs(), unit_cost)
}

// =============================================================================
// Revenue Split
// =============================================================================

/// Splits a sale's revenue evenly across `parts` ingredients.
///
/// The split is even, not cost-weighted. Leftover cents go one each to the
/// leading parts so the shares add up to `total` exactly.
///
/// ```rust
/// use larder_core::costing::split_revenue;
/// use larder_core::Money;
///
/// let shares = split_revenue(Money::from_cents(1000), 3);
/// let cents: Vec<i64> = shares.iter().map(|m| m.cents()).collect();
/// assert_eq!(cents, vec![334, 333, 333]);
/// ```
pub fn split_revenue(total: Money, parts: usize) -> Vec<Money> {
    if parts == 0 {
        return Vec::new();
    }

    let n = parts as i64;
    let base = total.cents() / n;
    let remainder = total.cents() % n;
    let step = remainder.signum();

    (0..n)
        .map(|i| {
            let extra = if i < remainder.abs() { step } else { 0 };
            Money::from_cents(base + extra)
        })
        .collect()
}

// =============================================================================
// Stock Counts
// =============================================================================

/// Outcome of comparing a physical count with the ledger balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCount {
    /// `actual - expected`; negative means stock went missing.
    pub difference: Quantity,
    /// `Waste` for a shortfall, `Adjustment` otherwise (including no change).
    pub kind: MovementType,
}

/// `None` when the difference does not fit in a `Quantity`.
pub fn classify_count(expected: Quantity, actual: Quantity) -> Option<StockCount> {
    let difference = actual.checked_sub(expected)?;
    let kind = if difference.is_negative() {
        MovementType::Waste
    } else {
        MovementType::Adjustment
    };
    Some(StockCount { difference, kind })
}

fn saturate(value: i128) -> i64 {
    value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

// =============================================================================
// Unit Tests
// =============================================================================
