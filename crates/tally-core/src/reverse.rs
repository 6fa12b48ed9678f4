//! # Reverse Resolution
//!
//! When the user types a line total directly, derive the unit price that
//! produces it.
//!
//! ```text
//! net        = total ÷ (1 + tax% / 100)
//! gross      = net   ÷ (1 − discount% / 100)
//! unit_price = gross ÷ quantity
//! ```
//!
//! ## Guards
//! Both divisors that can reach zero are checked before dividing:
//! - `discount = 100%`  → [`CoreError::InvalidDiscountRate`](crate::CoreError::InvalidDiscountRate)
//! - `quantity <= 0`    → [`CoreError::InvalidQuantity`](crate::CoreError::InvalidQuantity)
//!
//! A near-full discount on a huge total can still push the gross past the
//! `Decimal` range; that is
//! [`CoreError::AmountOutOfRange`](crate::CoreError::AmountOutOfRange).
//!
//! The edit is rejected; the caller keeps the previous unit price.

use rust_decimal::Decimal;

use crate::error::CoreResult;
use crate::money::{in_range, Money};
use crate::types::{DiscountRate, TaxPolicy, TaxRate};
use crate::validation::{validate_invertible_discount, validate_line_total, validate_quantity};

/// Back-solves the unit price implied by `total`.
///
/// The result is unrounded; the caller stores `total` exactly as typed and
/// overwrites the unit price with this value.
///
/// ## Example
/// ```rust
/// use rust_decimal_macros::dec;
/// use tally_core::reverse::resolve_unit_price;
/// use tally_core::{DiscountRate, Money, TaxPolicy, TaxRate};
///
/// let price = resolve_unit_price(
///     Money::new(dec!(216.00)),
///     dec!(2),
///     DiscountRate::from_percent(dec!(10)),
///     TaxRate::from_percent(dec!(20)),
///     &TaxPolicy::default(),
/// )
/// .unwrap();
/// assert_eq!(price.round_to(2), Money::new(dec!(100.00)));
/// ```
pub fn resolve_unit_price(
    total: Money,
    quantity: Decimal,
    discount_rate: DiscountRate,
    tax_rate: TaxRate,
    policy: &TaxPolicy,
) -> CoreResult<Money> {
    validate_line_total(total)?;
    validate_quantity(quantity)?;
    validate_invertible_discount(discount_rate)?;
    policy.check(tax_rate)?;

    // Divisors are non-zero past the guards; `None` here is overflow.
    let net = in_range(total.checked_div(tax_rate.gross_up_factor()), "net from total")?;
    let gross = in_range(
        net.checked_div(discount_rate.remaining_fraction()),
        "gross from net",
    )?;
    in_range(gross.checked_div(quantity), "unit price")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::line::{compute_total, LineInput};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn resolve(total: Decimal, q: Decimal, d: Decimal, t: Decimal) -> CoreResult<Money> {
        resolve_unit_price(
            Money::new(total),
            q,
            DiscountRate::from_percent(d),
            TaxRate::from_percent(t),
            &TaxPolicy::default(),
        )
    }

    #[test]
    fn test_example_reverse() {
        let price = resolve(dec!(216.00), dec!(2), dec!(10), dec!(20)).unwrap();
        assert_eq!(price.round_to(2), Money::new(dec!(100.00)));
    }

    #[test]
    fn test_reverse_without_discount_or_tax() {
        let price = resolve(dec!(90), dec!(3), dec!(0), dec!(0)).unwrap();
        assert_eq!(price.amount(), dec!(30));
    }

    #[test]
    fn test_reverse_keeps_full_precision() {
        // 100 / 1.2 / 3 = 27.777...
        let price = resolve(dec!(100), dec!(3), dec!(0), dec!(20)).unwrap();
        assert!(price.amount().scale() > 2);
        assert_eq!(price.round_to(2).amount(), dec!(27.78));
    }

    #[test]
    fn test_zero_total_gives_zero_price() {
        let price = resolve(dec!(0), dec!(4), dec!(25), dec!(10)).unwrap();
        assert!(price.is_zero());
    }

    #[test]
    fn test_full_discount_is_rejected() {
        let err = resolve(dec!(100), dec!(1), dec!(100), dec!(20)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscountRate { .. }));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let err = resolve(dec!(100), dec!(0), dec!(0), dec!(20)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));
    }

    #[test]
    fn test_negative_total_is_rejected() {
        let err = resolve(dec!(-1), dec!(1), dec!(0), dec!(20)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLineTotal { .. }));
    }

    #[test]
    fn test_huge_total_with_near_full_discount_is_out_of_range() {
        let err = resolve(dec!(100000000000000000000000000), dec!(1), dec!(99.99), dec!(20))
            .unwrap_err();
        assert_eq!(err, CoreError::AmountOutOfRange { operation: "gross from net" });
    }

    #[test]
    fn test_max_total_without_discount_resolves() {
        let price = resolve(Decimal::MAX, dec!(1000), dec!(0), dec!(0)).unwrap();
        assert!(price.is_positive());
    }

    #[test]
    fn test_disallowed_tax_is_rejected() {
        let err = resolve(dec!(100), dec!(1), dec!(0), dec!(18)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTaxRate { .. }));
    }

    fn tax_rate() -> impl Strategy<Value = Decimal> {
        prop_oneof![Just(dec!(0)), Just(dec!(1)), Just(dec!(10)), Just(dec!(20))]
    }

    proptest! {
        #[test]
        fn prop_forward_reverse_round_trip(
            qty_milli in 1i64..1_000_000,
            price_cents in 0i64..10_000_000,
            discount_bp in 0i64..9_999,
            tax in tax_rate(),
        ) {
            let quantity = Decimal::new(qty_milli, 3);
            let unit_price = Money::from_cents(price_cents);
            let discount = DiscountRate::from_percent(Decimal::new(discount_bp, 2));
            let tax = TaxRate::from_percent(tax);
            let policy = TaxPolicy::default();

            let line = LineInput::new(quantity, unit_price, discount, tax);
            let total = compute_total(&line, &policy).unwrap();
            let resolved = resolve_unit_price(total, quantity, discount, tax, &policy).unwrap();

            prop_assert!((resolved.amount() - unit_price.amount()).abs() <= dec!(0.01));
        }
    }
}
