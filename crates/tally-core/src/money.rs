//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Invoice editing also runs BACKWARDS:                                   │
//! │    total 216.00 ÷ 1.20 ÷ 0.90 ÷ 2 = unit price 100.00                  │
//! │  Integer cents cannot carry that division without rounding early.      │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, rounded exactly once on commit          │
//! │    live value  : 33.333333333333333333333333333                        │
//! │    committed   : 33.33                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99
//! let line = price.checked_mul(Decimal::from(3)).unwrap();
//! assert_eq!(line.round_to(2), Money::from_cents(3297));
//!
//! // Nothing panics on overflow; the caller gets `None` and reports it.
//! assert!(Money::new(Decimal::MAX).checked_mul(Decimal::from(2)).is_none());
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

/// Hundred, as a decimal. Percentages are stored as 0..=100.
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds a decimal to `scale` places, midpoint away from zero.
///
/// This is the only rounding rule in the engine. It is applied at commit
/// time and at the end of a currency conversion, never in between.
#[inline]
pub fn round_half_up(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the document currency.
///
/// ## Design Decisions
/// - **Decimal (signed)**: exact base-10, negative values allowed for
///   intermediate differences
/// - **Unrounded by default**: live editing state keeps full precision
/// - **Single field tuple struct**: zero-cost wrapper over `Decimal`
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  ProductQuote.price ──► convert() ──► LineInput.unit_price              │
/// │                                             │                           │
/// │                                             ▼                           │
/// │            compute_total() ◄──────► resolve_unit_price()                │
/// │                                             │                           │
/// │                                             ▼                           │
/// │   DocumentTotals { subtotal, discount_total, tax_total, total }        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (two decimal places).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Rounds to `scale` decimal places (midpoint away from zero), padding
    /// with zeros so the result always shows exactly `scale` places.
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::new(dec!(2.345)).round_to(2), Money::new(dec!(2.35)));
    /// assert_eq!(Money::new(dec!(7)).round_to(2).to_string(), "7.00");
    /// ```
    #[inline]
    pub fn round_to(&self, scale: u32) -> Money {
        let mut rounded = round_half_up(self.0, scale);
        rounded.rescale(scale);
        Money(rounded)
    }

    /// Multiplies by a quantity or factor, or returns `None` when the
    /// product does not fit in a `Decimal`.
    #[inline]
    pub fn checked_mul(&self, factor: Decimal) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Returns `percent`% of this amount, unrounded.
    ///
    /// The percentage is turned into a fraction first, so any rate in
    /// [0, 100] yields a result no larger than the amount itself.
    ///
    /// ```rust
    /// use rust_decimal_macros::dec;
    /// use tally_core::money::Money;
    ///
    /// let net = Money::new(dec!(180));
    /// assert_eq!(net.checked_percent(dec!(20)), Some(Money::new(dec!(36))));
    /// ```
    #[inline]
    pub fn checked_percent(&self, percent: Decimal) -> Option<Money> {
        let fraction = percent.checked_div(HUNDRED)?;
        self.checked_mul(fraction)
    }

    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    #[inline]
    pub fn saturating_add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    #[inline]
    pub fn saturating_sub(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }

    /// Sums amounts, or returns `None` on the first overflow.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Divides by `divisor`, or returns `None` when the divisor is zero or
    /// the quotient overflows.
    #[inline]
    pub fn checked_div(&self, divisor: Decimal) -> Option<Money> {
        self.0.checked_div(divisor).map(Money)
    }

    /// The smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self <= other {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the raw decimal; formatting with a symbol is a UI concern.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

/// Reports the `None` of a checked operation as `AmountOutOfRange`.
pub(crate) fn in_range<T>(value: Option<T>, operation: &'static str) -> CoreResult<T> {
    value.ok_or(CoreError::AmountOutOfRange { operation })
}

// =============================================================================
// Unit Tests
// =============================================================================
