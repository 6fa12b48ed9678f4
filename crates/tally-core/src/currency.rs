//! # Currency Conversion
//!
//! Converts product prices into the document currency.
//!
//! ## Conversion Paths
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rate(c) = units of BASE for one unit of c      (rate(BASE) = 1)        │
//! │                                                                         │
//! │  same currency   : amount                       (no rounding at all)    │
//! │  foreign → base  : amount × rate(from)                                  │
//! │  base → foreign  : amount ÷ rate(to)                                    │
//! │  foreign → other : amount × rate(from) ÷ rate(to)   (via base)          │
//! │                                                     │                   │
//! │                                                     ▼                   │
//! │                                   ONE rounding step at the very end     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The table itself is owned by the caller behind [`RateProvider`], so a
//! live-rate source can replace [`StaticRateTable`] without touching the
//! calculation.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::money::{in_range, round_half_up, Money};
use crate::types::Currency;

// =============================================================================
// Rate Provider
// =============================================================================

/// Source of exchange rates relative to a base currency.
pub trait RateProvider {
    /// The currency every rate is expressed in.
    fn base(&self) -> Currency;

    /// Units of [`RateProvider::base`] for one unit of `currency`.
    ///
    /// Implementations return `Some(1)` for the base currency and `None`
    /// when the currency is unknown.
    fn rate(&self, currency: Currency) -> Option<Decimal>;
}

/// Fixed rate table, typically loaded from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRateTable {
    base: Currency,
    rates: BTreeMap<Currency, Decimal>,
}

impl StaticRateTable {
    /// Creates an empty table for `base`.
    pub fn new(base: Currency) -> Self {
        StaticRateTable {
            base,
            rates: BTreeMap::new(),
        }
    }

    /// Builder-style rate registration.
    pub fn with_rate(mut self, currency: Currency, rate: Decimal) -> Self {
        self.set_rate(currency, rate);
        self
    }

    /// Sets or replaces the rate for `currency`. The base rate is fixed at 1.
    pub fn set_rate(&mut self, currency: Currency, rate: Decimal) {
        if currency != self.base {
            self.rates.insert(currency, rate);
        }
    }

    /// Currencies with a configured rate, base included.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut all: Vec<Currency> = self.rates.keys().copied().collect();
        all.push(self.base);
        all.sort();
        all
    }
}

impl RateProvider for StaticRateTable {
    fn base(&self) -> Currency {
        self.base
    }

    fn rate(&self, currency: Currency) -> Option<Decimal> {
        if currency == self.base {
            return Some(Decimal::ONE);
        }
        self.rates.get(&currency).copied()
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Converts `amount` from one currency to another.
///
/// ## Rules
/// - `from == to` returns `amount` untouched, without rounding
/// - otherwise the result is rounded once, to `scale` places
/// - a missing or non-positive rate on either side is
///   [`CoreError::MissingExchangeRate`]
/// - a result past the `Decimal` range is [`CoreError::AmountOutOfRange`]
///
/// ## Example
/// ```rust
/// use rust_decimal_macros::dec;
/// use tally_core::currency::{convert, StaticRateTable};
/// use tally_core::{Currency, Money};
///
/// let rates = StaticRateTable::new(Currency::Try).with_rate(Currency::Usd, dec!(32.50));
/// let price = convert(Money::new(dec!(10)), Currency::Usd, Currency::Try, &rates, 2).unwrap();
/// assert_eq!(price, Money::new(dec!(325.00)));
/// ```
pub fn convert<P: RateProvider + ?Sized>(
    amount: Money,
    from: Currency,
    to: Currency,
    rates: &P,
    scale: u32,
) -> CoreResult<Money> {
    if from == to {
        return Ok(amount);
    }

    let missing = || CoreError::MissingExchangeRate { from, to };
    let usable = |currency: Currency| {
        rates
            .rate(currency)
            .filter(|rate| *rate > Decimal::ZERO)
            .ok_or_else(missing)
    };

    let base = rates.base();
    let in_base = if from == base {
        amount
    } else {
        in_range(amount.checked_mul(usable(from)?), "currency conversion")?
    };

    let in_target = if to == base {
        in_base
    } else {
        in_range(in_base.checked_div(usable(to)?), "currency conversion")?
    };

    Ok(Money::new(round_half_up(in_target.amount(), scale)))
}

/// A rate provider bound to a rounding scale.
///
/// Convenience wrapper for callers converting many prices with the same
/// settings.
#[derive(Debug, Clone)]
pub struct CurrencyConverter<P> {
    rates: P,
    scale: u32,
}

impl<P: RateProvider> CurrencyConverter<P> {
    pub fn new(rates: P, scale: u32) -> Self {
        CurrencyConverter { rates, scale }
    }

    pub fn convert(&self, amount: Money, from: Currency, to: Currency) -> CoreResult<Money> {
        convert(amount, from, to, &self.rates, self.scale)
    }

    pub fn rates(&self) -> &P {
        &self.rates
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn table() -> StaticRateTable {
        StaticRateTable::new(Currency::Try)
            .with_rate(Currency::Usd, dec!(32.50))
            .with_rate(Currency::Eur, dec!(35.20))
    }

    #[test]
    fn test_same_currency_is_not_rounded() {
        let amount = Money::new(dec!(10.12345));
        let out = convert(amount, Currency::Usd, Currency::Usd, &table(), 2).unwrap();
        assert_eq!(out.amount(), dec!(10.12345));
    }

    #[test]
    fn test_foreign_to_base() {
        let out = convert(Money::new(dec!(10)), Currency::Usd, Currency::Try, &table(), 2).unwrap();
        assert_eq!(out.amount(), dec!(325.00));
    }

    #[test]
    fn test_base_to_foreign() {
        let out = convert(Money::new(dec!(100)), Currency::Try, Currency::Usd, &table(), 2).unwrap();
        // 100 / 32.5 = 3.0769...
        assert_eq!(out.amount(), dec!(3.08));
    }

    #[test]
    fn test_cross_rate_rounds_once() {
        // 100 USD → 3250 TRY → 92.329545... EUR
        let out = convert(Money::new(dec!(100)), Currency::Usd, Currency::Eur, &table(), 2).unwrap();
        assert_eq!(out.amount(), dec!(92.33));
    }

    #[test]
    fn test_missing_rate() {
        let rates = StaticRateTable::new(Currency::Try).with_rate(Currency::Usd, dec!(32.5));
        let err = convert(Money::new(dec!(1)), Currency::Eur, Currency::Try, &rates, 2).unwrap_err();
        assert_eq!(
            err,
            CoreError::MissingExchangeRate {
                from: Currency::Eur,
                to: Currency::Try
            }
        );
    }

    #[test]
    fn test_zero_rate_is_missing() {
        let rates = StaticRateTable::new(Currency::Try).with_rate(Currency::Usd, dec!(0));
        assert!(convert(Money::new(dec!(1)), Currency::Try, Currency::Usd, &rates, 2).is_err());
    }

    #[test]
    fn test_huge_amount_is_out_of_range() {
        let huge = Money::new(dec!(10000000000000000000000000000)); // 1e28
        let err = convert(huge, Currency::Usd, Currency::Try, &table(), 2).unwrap_err();
        assert_eq!(err, CoreError::AmountOutOfRange { operation: "currency conversion" });

        // Dividing into a larger unit still fits.
        let out = convert(huge, Currency::Try, Currency::Usd, &table(), 2).unwrap();
        assert!(out < huge);
    }

    #[test]
    fn test_tiny_rate_overflows_on_division() {
        let rates = StaticRateTable::new(Currency::Try).with_rate(Currency::Usd, dec!(0.0001));
        let err = convert(Money::new(Decimal::MAX), Currency::Try, Currency::Usd, &rates, 2)
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOutOfRange { .. }));
    }

    #[test]
    fn test_base_rate_cannot_be_overridden() {
        let rates = StaticRateTable::new(Currency::Try).with_rate(Currency::Try, dec!(2));
        assert_eq!(rates.rate(Currency::Try), Some(Decimal::ONE));
        assert_eq!(rates.currencies(), vec![Currency::Try]);
    }

    #[test]
    fn test_converter_wrapper() {
        let converter = CurrencyConverter::new(table(), 2);
        let out = converter
            .convert(Money::new(dec!(1)), Currency::Eur, Currency::Try)
            .unwrap();
        assert_eq!(out.amount(), dec!(35.20));
    }

    #[test]
    fn test_usd_eur_round_trip_within_one_unit() {
        let rates = table();
        let original = Money::new(dec!(100.00));
        let eur = convert(original, Currency::Usd, Currency::Eur, &rates, 2).unwrap();
        let back = convert(eur, Currency::Eur, Currency::Usd, &rates, 2).unwrap();
        assert!((back.amount() - original.amount()).abs() <= dec!(0.01));
    }

    fn currency() -> impl Strategy<Value = Currency> {
        prop_oneof![Just(Currency::Try), Just(Currency::Usd), Just(Currency::Eur)]
    }

    proptest! {
        /// Converting X → Y → X lands within one rounding unit of the
        /// original, scaled by how much coarser Y's unit is than X's.
        #[test]
        fn prop_round_trip_within_rounding(cents in 0i64..100_000_000, from in currency(), to in currency()) {
            let rates = table();
            let original = Money::from_cents(cents);
            let there = convert(original, from, to, &rates, 2).unwrap();
            let back = convert(there, to, from, &rates, 2).unwrap();

            let ratio = rates.rate(to).unwrap() / rates.rate(from).unwrap();
            let unit = dec!(0.01);
            let tolerance = unit * ratio.max(Decimal::ONE);
            prop_assert!((back.amount() - original.amount()).abs() <= tolerance);
        }
    }
}
