//! # Quantity Module
//!
//! Fixed-point ingredient quantities.
//!
//! ## Representation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Quantity(i64) counts THOUSANDTHS of the ingredient's unit              │
//! │                                                                         │
//! │    unit "kg"  →  1 milli-unit = 1 g                                     │
//! │    unit "L"   →  1 milli-unit = 1 ml                                    │
//! │    unit "ea"  →  1 milli-unit = 1/1000 of a piece                       │
//! │                                                                         │
//! │  Recipe line "0.15 kg chicken" is Quantity(150), exactly.              │
//! │  Ledger sums never accumulate binary rounding noise, so the            │
//! │  balance-equals-sum-of-movements check is an integer comparison.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantities are signed: movement deltas are negative for sales and waste.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

/// Number of milli-units in one whole unit.
pub const MILLI_PER_UNIT: i64 = 1000;

/// A signed ingredient quantity in thousandths of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Quantity(i64);

impl Quantity {
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity from whole units.
    ///
    /// ```rust
    /// use larder_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(12).milli(), 12_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Quantity(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Quantity(self.0.abs())
    }

    /// Scales a per-portion quantity by the number of portions sold.
    ///
    /// Returns `None` on overflow.
    #[inline]
    pub const fn checked_times(&self, count: i64) -> Option<Self> {
        match self.0.checked_mul(count) {
            Some(milli) => Some(Quantity(milli)),
            None => None,
        }
    }

    /// Sum of two quantities, `None` on overflow. Balance updates go
    /// through this before anything is written.
    #[inline]
    pub const fn checked_add(&self, other: Quantity) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(milli) => Some(Quantity(milli)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_sub(&self, other: Quantity) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(milli) => Some(Quantity(milli)),
            None => None,
        }
    }
}

/// Shows a quantity with three decimals: `12.500`, `-0.250`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_unit = MILLI_PER_UNIT as u64;
        write!(f, "{}{}.{:03}", sign, abs / per_unit, abs % per_unit)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Quantity::zero()
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), |acc, q| acc + q)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Quantity::from_milli(12_500).to_string(), "12.500");
        assert_eq!(Quantity::from_milli(-250).to_string(), "-0.250");
        assert_eq!(Quantity::from_units(3).to_string(), "3.000");
        assert_eq!(Quantity::zero().to_string(), "0.000");
    }

    #[test]
    fn test_arithmetic() {
        let mut on_hand = Quantity::from_units(10);
        on_hand -= Quantity::from_milli(1_500);
        assert_eq!(on_hand.milli(), 8_500);

        on_hand += Quantity::from_units(2);
        assert_eq!(on_hand, Quantity::from_milli(10_500));

        let total: Quantity = [Quantity::from_units(1), -Quantity::from_milli(250)]
            .into_iter()
            .sum();
        assert_eq!(total.milli(), 750);
    }

    #[test]
    fn test_checked_times() {
        assert_eq!(
            Quantity::from_milli(150).checked_times(3),
            Some(Quantity::from_milli(450))
        );
        assert_eq!(Quantity::from_milli(i64::MAX).checked_times(2), None);
    }

    #[test]
    fn test_checked_add_and_sub() {
        let half = Quantity::from_milli(i64::MAX / 2 + 1);
        assert_eq!(half.checked_add(half), None);
        assert_eq!(
            Quantity::from_units(2).checked_add(Quantity::from_milli(500)),
            Some(Quantity::from_milli(2_500))
        );

        assert_eq!(Quantity::from_milli(i64::MIN).checked_sub(Quantity::from_milli(1)), None);
        assert_eq!(
            Quantity::from_units(1).checked_sub(Quantity::from_units(3)),
            Some(Quantity::from_units(-2))
        );
    }

    #[test]
    fn test_serializes_as_milli_units() {
        let json = serde_json::to_string(&Quantity::from_milli(1_250)).unwrap();
        assert_eq!(json, "1250");
    }
}
