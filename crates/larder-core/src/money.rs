//! # Money
//!
//! Costs, prices and revenue as whole cents.
//!
//! ## Why Not f64
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Weighted-average costing divides on every delivery:                   │
//! │    (10 × 5.00 + 3 × 7.10) / 13 = 5.484615384...                        │
//! │                                                                         │
//! │  Repeat that across hundreds of deliveries in f64 and the stored       │
//! │  ingredient cost drifts away from anything a person can audit.         │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every cost, price, and revenue share is an i64 count of cents.      │
//! │    Division happens once, in i128, with one explicit rounding rule.    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use larder_core::money::Money;
//!
//! let price = Money::from_cents(999);       // $9.99
//! let revenue = price.checked_times(3);     // $29.97
//! assert_eq!(revenue.map(|m| m.cents()), Some(2997));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Ingredient.cost_cents ──► weighted average on delivery                 │
/// │                      └──► waste valuation on stock count                │
/// │                                                                         │
/// │  MenuItem.price_cents × quantity sold ──► revenue split per ingredient │
/// │                                                                         │
/// │  Report summary: Σ delivery cost, Σ sales revenue, Σ waste cost        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Wraps a cent count.
    ///
    /// ```rust
    /// use larder_core::money::Money;
    ///
    /// let cost = Money::from_cents(250); // $2.50
    /// assert_eq!(cost.cents(), 250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
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
        Money(self.0.abs())
    }

    /// Multiplies by a whole count (menu price × portions sold).
    /// Returns `None` on overflow.
    ///
    /// ```rust
    /// use larder_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(450).checked_times(2), Some(Money::from_cents(900)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_times(2), None);
    /// ```
    #[inline]
    pub const fn checked_times(&self, count: i64) -> Option<Self> {
        match self.0.checked_mul(count) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

/// Integer division that rounds half away from zero.
///
/// This is the single rounding rule for currency in the crate:
/// `2.345 → 2.35`, `-2.345 → -2.35`, `2.344 → 2.34`.
///
/// `den` must be positive.
pub(crate) fn div_round_half_away(num: i128, den: i128) -> i128 {
    debug_assert!(den > 0, "rounding denominator must be positive");
    let quotient = num / den;
    let remainder = num % den;
    if remainder.abs() * 2 >= den {
        quotient + num.signum()
    } else {
        quotient
    }
}

/// Shows money as `$12.34` (debugging and CLI output only).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", cents / 100, cents % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_as_dollars() {
        assert_eq!(Money::from_cents(1250).to_string(), "$12.50");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::from_cents(-450).to_string(), "-$4.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
        assert_eq!(Money::from_cents(i64::MIN).to_string(), "-$92233720368547758.08");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(450);

        assert_eq!((a + b).cents(), 1450);
        assert_eq!((a - b).cents(), 550);
        assert_eq!((-b).cents(), -450);
        assert_eq!(a.checked_times(3), Some(Money::from_cents(3000)));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1450)));

        let total: Money = [a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 1900);
    }

    #[test]
    fn test_checked_ops_refuse_to_overflow() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!(huge.checked_times(3), None);
        assert_eq!(huge.checked_times(-3), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(
            Money::from_cents(i64::MIN).checked_add(Money::from_cents(-1)),
            None
        );
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        assert_eq!(div_round_half_away(2345, 10), 235);
        assert_eq!(div_round_half_away(2344, 10), 234);
        assert_eq!(div_round_half_away(-2345, 10), -235);
        assert_eq!(div_round_half_away(-2344, 10), -234);
        assert_eq!(div_round_half_away(0, 7), 0);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-550).abs().cents(), 550);
    }
}
