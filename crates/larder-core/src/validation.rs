//! # Validation Module
//!
//! Input checks that run before a ledger transaction is opened.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (HTTP layer, seed tool)                               │
//! │  └── Parses decimals with parse_quantity / parse_money                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── quantity > 0 for deliveries, ≥ 0 for counts                       │
//! │  ├── cost ≥ 0, portions ≥ 1                                            │
//! │  └── text lengths                                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK on movement type and recipe line quantity                   │
//! │  ├── UNIQUE (location, ingredient) on inventory                        │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::{MAX_NAME_LEN, MAX_NOTES_LEN, MAX_REFERENCE_LEN, MAX_SALE_PORTIONS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Ledger Input Validators
// =============================================================================

/// A delivery must bring in stock.
pub fn validate_delivery_quantity(quantity: Quantity) -> ValidationResult<()> {
    if !quantity.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Delivery unit cost. Zero is allowed (free samples) and skips costing.
pub fn validate_delivery_cost(cost: Money) -> ValidationResult<()> {
    if cost.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "cost".to_string(),
        });
    }
    Ok(())
}

/// Validates the number of portions sold.
///
/// ## Rules
/// - At least 1
/// - At most MAX_SALE_PORTIONS (999), which catches typos like 1000 for 10
///
/// ## Example
/// ```rust
/// use larder_core::validation::validate_sale_quantity;
///
/// assert!(validate_sale_quantity(2).is_ok());
/// assert!(validate_sale_quantity(0).is_err());
/// ```
pub fn validate_sale_quantity(portions: i64) -> ValidationResult<()> {
    if portions < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if portions > MAX_SALE_PORTIONS {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_SALE_PORTIONS,
        });
    }

    Ok(())
}

/// A physical count can be zero but never negative.
pub fn validate_actual_quantity(quantity: Quantity) -> ValidationResult<()> {
    if quantity.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "actual_quantity".to_string(),
        });
    }
    Ok(())
}

/// Recipe lines may be zero (garnish) but not negative.
pub fn validate_recipe_quantity(quantity: Quantity) -> ValidationResult<()> {
    if quantity.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "recipe quantity".to_string(),
        });
    }
    Ok(())
}

pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustBeNonNegative {
            field: "price".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (location, staff, ingredient, recipe, menu item).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    validate_optional_text("notes", notes, MAX_NOTES_LEN)
}

pub fn validate_reference(reference: Option<&str>) -> ValidationResult<()> {
    validate_optional_text("reference", reference, MAX_REFERENCE_LEN)
}

fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Parses a decimal quantity such as `"12.5"` into milli-units.
///
/// At most three decimal places are accepted.
///
/// ```rust
/// use larder_core::validation::parse_quantity;
///
/// assert_eq!(parse_quantity("0.15").unwrap().milli(), 150);
/// assert!(parse_quantity("0.1234").is_err());
/// ```
pub fn parse_quantity(input: &str) -> ValidationResult<Quantity> {
    parse_fixed("quantity", input, 3).map(Quantity::from_milli)
}

/// Parses a decimal amount such as `"29.95"` into cents.
///
/// A leading `$` is tolerated. At most two decimal places are accepted.
pub fn parse_money(input: &str) -> ValidationResult<Money> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_prefix('$').unwrap_or(trimmed);
    parse_fixed("amount", trimmed, 2).map(Money::from_cents)
}

/// Parses `[-]digits[.digits]` into an integer scaled by `10^scale`.
fn parse_fixed(field: &str, input: &str, scale: u32) -> ValidationResult<i64> {
    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let input = input.trim();
    if input.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("expected a number"));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected a decimal number"));
    }
    if fraction.len() > scale as usize {
        return Err(invalid(&format!("at most {} decimal places", scale)));
    }

    let factor = 10_i64.pow(scale);
    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid("number is too large"))?
    };
    let fraction_value: i64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = scale as usize);
        padded.parse().map_err(|_| invalid("expected a decimal number"))?
    };

    let value = whole_value
        .checked_mul(factor)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| invalid("number is too large"))?;

    Ok(if negative { -value } else { value })
}

// =============================================================================
// Unit Tests
// =============================================================================
