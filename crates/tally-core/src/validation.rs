//! # Validation Module
//!
//! Input checks shared by the forward, reverse and aggregate calculations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Editor field buffer (tally-editor)                           │
//! │  ├── Parse typed text into a Decimal                                   │
//! │  └── Keep the previous value when parsing fails                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── quantity > 0, unit price >= 0, discount in [0, 100]               │
//! │  └── tax rate allowed by TaxPolicy                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Calculation                                                  │
//! │  └── only ever sees inputs that cannot divide by zero                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal_macros::dec;
//! use tally_core::validation::{validate_quantity, parse_decimal};
//!
//! assert!(validate_quantity(dec!(2)).is_ok());
//! assert!(validate_quantity(dec!(0)).is_err());
//! assert_eq!(parse_decimal("12,5", "price").unwrap(), dec!(12.5));
//! ```

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, HUNDRED};
use crate::types::DiscountRate;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be strictly positive (fractional quantities such as 1.5 kg are fine)
pub fn validate_quantity(quantity: Decimal) -> CoreResult<()> {
    if quantity <= Decimal::ZERO {
        return Err(CoreError::InvalidQuantity { quantity });
    }
    Ok(())
}

/// Validates a unit price.
///
/// ## Rules
/// - Must be non-negative; zero is allowed (free items, fresh rows)
pub fn validate_unit_price(unit_price: Money) -> CoreResult<()> {
    if unit_price.is_negative() {
        return Err(CoreError::InvalidUnitPrice {
            unit_price: unit_price.amount(),
        });
    }
    Ok(())
}

/// Validates a line discount for forward calculation.
///
/// ## Rules
/// - Must be between 0 and 100 inclusive
pub fn validate_discount_rate(rate: DiscountRate) -> CoreResult<()> {
    let percent = rate.percent();
    if percent < Decimal::ZERO || percent > HUNDRED {
        return Err(CoreError::InvalidDiscountRate {
            rate: percent,
            reason: "must be between 0 and 100".to_string(),
        });
    }
    Ok(())
}

/// Validates a line discount for reverse resolution.
///
/// ## Rules
/// - Same as [`validate_discount_rate`]
/// - Additionally, 100% is rejected: the net amount is always zero, so no
///   unit price can be derived from a total
pub fn validate_invertible_discount(rate: DiscountRate) -> CoreResult<()> {
    validate_discount_rate(rate)?;
    if rate.is_full() {
        return Err(CoreError::InvalidDiscountRate {
            rate: rate.percent(),
            reason: "a 100% discount cannot be reversed into a unit price".to_string(),
        });
    }
    Ok(())
}

/// Validates a directly typed line total.
pub fn validate_line_total(total: Money) -> CoreResult<()> {
    if total.is_negative() {
        return Err(CoreError::InvalidLineTotal {
            total: total.amount(),
        });
    }
    Ok(())
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses user-typed numeric text.
///
/// ## Rules
/// - Surrounding whitespace is ignored
/// - Empty input is zero (a cleared field)
/// - `,` is accepted as the decimal separator
/// - A trailing separator (`"12."`) is accepted while typing
/// - Scientific notation and thousands separators are rejected
pub fn parse_decimal(text: &str, field: &str) -> ValidationResult<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let normalized = trimmed.replace(',', ".");
    let normalized = normalized.strip_suffix('.').unwrap_or(&normalized);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }

    if normalized.matches('.').count() > 1 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "more than one decimal separator".to_string(),
        });
    }

    Decimal::from_str(normalized).map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })
}

/// Validates a percentage setting (e.g., a configured tax rate).
pub fn validate_percentage(value: Decimal, field: &str) -> ValidationResult<()> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: Decimal::ZERO,
            max: HUNDRED,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(dec!(1)).is_ok());
        assert!(validate_quantity(dec!(0.001)).is_ok());

        assert!(validate_quantity(dec!(0)).is_err());
        assert!(validate_quantity(dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Money::zero()).is_ok());
        assert!(validate_unit_price(Money::from_cents(1099)).is_ok());
        assert!(validate_unit_price(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_discount_rate() {
        assert!(validate_discount_rate(DiscountRate::from_percent(dec!(0))).is_ok());
        assert!(validate_discount_rate(DiscountRate::from_percent(dec!(100))).is_ok());
        assert!(validate_discount_rate(DiscountRate::from_percent(dec!(100.5))).is_err());
        assert!(validate_discount_rate(DiscountRate::from_percent(dec!(-0.5))).is_err());
    }

    #[test]
    fn test_validate_invertible_discount() {
        assert!(validate_invertible_discount(DiscountRate::from_percent(dec!(99.99))).is_ok());
        let err = validate_invertible_discount(DiscountRate::from_percent(dec!(100))).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscountRate { .. }));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("", "price").unwrap(), dec!(0));
        assert_eq!(parse_decimal(" 12.5 ", "price").unwrap(), dec!(12.5));
        assert_eq!(parse_decimal("12,5", "price").unwrap(), dec!(12.5));
        assert_eq!(parse_decimal("12.", "price").unwrap(), dec!(12));
        assert_eq!(parse_decimal("-3", "price").unwrap(), dec!(-3));

        assert!(parse_decimal("1.2.3", "price").is_err());
        assert!(parse_decimal("abc", "price").is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert!(validate_percentage(dec!(20), "tax").is_ok());
        assert!(validate_percentage(dec!(120), "tax").is_err());
    }
}
