//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Pricing rule violations                        │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  tally-editor errors (separate crate)                                  │
//! │  └── EditorError      - Session, catalog and config failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EditorError → UI / CLI            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the offending value in error messages
//! 3. Errors are enum variants, never String
//! 4. A rejected computation never yields a partial or non-finite figure

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Currency;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing errors.
///
/// Every variant corresponds to an input the engine refuses to compute with.
/// The caller keeps the previous valid value of the field that was edited.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Quantity is zero or negative.
    ///
    /// ## When This Occurs
    /// - User clears the quantity field and it parses as 0
    /// - Reverse resolution would divide by a zero quantity
    #[error("Quantity must be greater than zero, got {quantity}")]
    InvalidQuantity { quantity: Decimal },

    /// Unit price is negative.
    #[error("Unit price cannot be negative, got {unit_price}")]
    InvalidUnitPrice { unit_price: Decimal },

    /// Discount rate is outside [0, 100], or exactly 100 during reverse
    /// resolution (zero divisor).
    #[error("Invalid discount rate {rate}%: {reason}")]
    InvalidDiscountRate { rate: Decimal, reason: String },

    /// Tax rate is not one of the allowed rates.
    #[error("Tax rate {rate}% is not allowed (allowed: {allowed:?})")]
    InvalidTaxRate { rate: Decimal, allowed: Vec<Decimal> },

    /// Conversion requested with a currency absent from the rate table.
    ///
    /// ## When This Occurs
    /// - Product priced in a currency the tenant has no rate for
    /// - Rate configured as zero or negative
    #[error("No usable exchange rate to convert {from} to {to}")]
    MissingExchangeRate { from: Currency, to: Currency },

    /// A directly typed line total is negative.
    #[error("Line total cannot be negative, got {total}")]
    InvalidLineTotal { total: Decimal },

    /// Document-level discount value is negative.
    #[error("Global discount cannot be negative, got {value}")]
    InvalidGlobalDiscount { value: Decimal },

    /// An intermediate amount does not fit in a `Decimal`.
    ///
    /// ## When This Occurs
    /// - Two very large typed values multiplied into a line gross
    /// - Line totals summed past the representable range
    /// - A huge price converted through a large exchange rate
    #[error("Amount out of range while computing {operation}")]
    AmountOutOfRange { operation: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any pricing rule runs, typically while parsing what
/// the user typed or what a configuration file contains.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Invalid format (e.g., "12,3,4" typed into a price field).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: Decimal,
        max: Decimal,
    },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidQuantity { quantity: dec!(0) };
        assert_eq!(err.to_string(), "Quantity must be greater than zero, got 0");

        let err = CoreError::MissingExchangeRate {
            from: Currency::Usd,
            to: Currency::Eur,
        };
        assert_eq!(err.to_string(), "No usable exchange rate to convert USD to EUR");

        let err = CoreError::AmountOutOfRange { operation: "line gross" };
        assert_eq!(err.to_string(), "Amount out of range while computing line gross");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::InvalidFormat {
            field: "quantity".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(err.to_string(), "quantity has invalid format: not a number");

        let err = ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: dec!(0),
            max: dec!(100),
        };
        assert_eq!(err.to_string(), "discount must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::NotAllowed {
            field: "currency".to_string(),
            allowed: vec!["TRY".to_string()],
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
