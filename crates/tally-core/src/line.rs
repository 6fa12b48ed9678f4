//! # Line Item Calculation
//!
//! Forward calculation: quantity, unit price, discount and tax → line total.
//!
//! ```text
//! gross    = quantity × unit_price
//! discount = gross × discount% / 100
//! net      = gross − discount
//! tax      = net × tax% / 100
//! total    = net + tax               ( = net × (1 + tax% / 100) )
//! ```
//!
//! Every step is checked: a figure past the `Decimal` range is reported as
//! [`CoreError::AmountOutOfRange`](crate::CoreError::AmountOutOfRange).
//! Nothing here rounds. Display precision is applied when the editor
//! commits a field, so a value being typed never snaps mid-keystroke.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::{in_range, Money};
use crate::types::{DiscountRate, TaxPolicy, TaxRate};
use crate::validation::{validate_discount_rate, validate_quantity, validate_unit_price};

/// The four user-editable figures of an invoice line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineInput {
    #[ts(type = "string")]
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount_rate: DiscountRate,
    pub tax_rate: TaxRate,
}

impl LineInput {
    pub fn new(
        quantity: Decimal,
        unit_price: Money,
        discount_rate: DiscountRate,
        tax_rate: TaxRate,
    ) -> Self {
        LineInput {
            quantity,
            unit_price,
            discount_rate,
            tax_rate,
        }
    }

    /// A freshly added row: one unit, free, no discount.
    pub fn blank(tax_rate: TaxRate) -> Self {
        LineInput {
            quantity: Decimal::ONE,
            unit_price: Money::zero(),
            discount_rate: DiscountRate::zero(),
            tax_rate,
        }
    }

    /// Checks every field against the pricing rules.
    pub fn validate(&self, policy: &TaxPolicy) -> CoreResult<()> {
        validate_quantity(self.quantity)?;
        validate_unit_price(self.unit_price)?;
        validate_discount_rate(self.discount_rate)?;
        policy.check(self.tax_rate)
    }
}

/// Every intermediate figure of one line, unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub gross: Money,
    pub discount_amount: Money,
    pub net: Money,
    pub tax: Money,
    pub total: Money,
}

impl LineBreakdown {
    /// Rounds every figure to `scale` places for display.
    pub fn rounded(&self, scale: u32) -> LineBreakdown {
        LineBreakdown {
            gross: self.gross.round_to(scale),
            discount_amount: self.discount_amount.round_to(scale),
            net: self.net.round_to(scale),
            tax: self.tax.round_to(scale),
            total: self.total.round_to(scale),
        }
    }
}

/// Computes every figure of a line after validating it.
pub fn breakdown(line: &LineInput, policy: &TaxPolicy) -> CoreResult<LineBreakdown> {
    line.validate(policy)?;
    breakdown_unchecked(line)
}

/// Forward calculation of a line total.
///
/// ## Example
/// ```rust
/// use rust_decimal_macros::dec;
/// use tally_core::line::{compute_total, LineInput};
/// use tally_core::{DiscountRate, Money, TaxPolicy, TaxRate};
///
/// let line = LineInput::new(
///     dec!(2),
///     Money::new(dec!(100)),
///     DiscountRate::from_percent(dec!(10)),
///     TaxRate::from_percent(dec!(20)),
/// );
/// let total = compute_total(&line, &TaxPolicy::default()).unwrap();
/// assert_eq!(total, Money::new(dec!(216)));
/// ```
pub fn compute_total(line: &LineInput, policy: &TaxPolicy) -> CoreResult<Money> {
    breakdown(line, policy).map(|b| b.total)
}

fn breakdown_unchecked(line: &LineInput) -> CoreResult<LineBreakdown> {
    let gross = in_range(line.unit_price.checked_mul(line.quantity), "line gross")?;
    let discount_amount = in_range(
        gross.checked_percent(line.discount_rate.percent()),
        "line discount",
    )?;
    let net = in_range(gross.checked_sub(discount_amount), "line net")?;
    let tax = in_range(net.checked_percent(line.tax_rate.percent()), "line tax")?;
    let total = in_range(net.checked_add(tax), "line total")?;

    Ok(LineBreakdown {
        gross,
        discount_amount,
        net,
        tax,
        total,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use rust_decimal_macros::dec;

    fn line(q: Decimal, p: Decimal, d: Decimal, t: Decimal) -> LineInput {
        LineInput::new(
            q,
            Money::new(p),
            DiscountRate::from_percent(d),
            TaxRate::from_percent(t),
        )
    }

    #[test]
    fn test_example_line_total() {
        let b = breakdown(&line(dec!(2), dec!(100), dec!(10), dec!(20)), &TaxPolicy::default())
            .unwrap();
        assert_eq!(b.gross.amount(), dec!(200));
        assert_eq!(b.discount_amount.amount(), dec!(20));
        assert_eq!(b.net.amount(), dec!(180));
        assert_eq!(b.tax.amount(), dec!(36));
        assert_eq!(b.total.round_to(2), Money::new(dec!(216.00)));
    }

    #[test]
    fn test_total_matches_net_times_gross_up() {
        let input = line(dec!(3), dec!(19.99), dec!(7.5), dec!(10));
        let b = breakdown(&input, &TaxPolicy::default()).unwrap();
        let expected = b.net.amount() * input.tax_rate.gross_up_factor();
        assert_eq!(b.total.amount(), expected);
    }

    #[test]
    fn test_live_total_is_not_rounded() {
        let total = compute_total(&line(dec!(1), dec!(12.345), dec!(0), dec!(1)), &TaxPolicy::default())
            .unwrap();
        // 12.345 × 1.01
        assert_eq!(total.amount(), dec!(12.46845));
    }

    #[test]
    fn test_blank_line() {
        let blank = LineInput::blank(TaxRate::from_percent(dec!(20)));
        assert_eq!(compute_total(&blank, &TaxPolicy::default()).unwrap(), Money::zero());
    }

    #[test]
    fn test_full_discount_is_valid_forward() {
        let total = compute_total(&line(dec!(1), dec!(50), dec!(100), dec!(20)), &TaxPolicy::default())
            .unwrap();
        assert!(total.is_zero());
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        let policy = TaxPolicy::default();

        let err = compute_total(&line(dec!(0), dec!(10), dec!(0), dec!(20)), &policy).unwrap_err();
        assert!(matches!(err, CoreError::InvalidQuantity { .. }));

        let err = compute_total(&line(dec!(1), dec!(-10), dec!(0), dec!(20)), &policy).unwrap_err();
        assert!(matches!(err, CoreError::InvalidUnitPrice { .. }));

        let err = compute_total(&line(dec!(1), dec!(10), dec!(101), dec!(20)), &policy).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscountRate { .. }));

        let err = compute_total(&line(dec!(1), dec!(10), dec!(0), dec!(18)), &policy).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTaxRate { .. }));
    }

    #[test]
    fn test_huge_quantity_times_price_is_out_of_range() {
        let huge = dec!(1000000000000000);
        let err = compute_total(&line(huge, huge, dec!(0), dec!(20)), &TaxPolicy::default())
            .unwrap_err();
        assert_eq!(err, CoreError::AmountOutOfRange { operation: "line gross" });
    }

    #[test]
    fn test_tax_pushing_past_max_is_out_of_range() {
        // The gross fits, the gross plus 20% tax does not.
        let err = compute_total(
            &line(dec!(1), Decimal::MAX, dec!(0), dec!(20)),
            &TaxPolicy::default(),
        )
        .unwrap_err();
        assert_eq!(err, CoreError::AmountOutOfRange { operation: "line total" });

        let untaxed = compute_total(
            &line(dec!(1), Decimal::MAX, dec!(0), dec!(0)),
            &TaxPolicy::default(),
        )
        .unwrap();
        assert_eq!(untaxed.amount(), Decimal::MAX);
    }

    #[test]
    fn test_rounded_breakdown() {
        let b = breakdown(&line(dec!(1), dec!(10.005), dec!(0), dec!(0)), &TaxPolicy::default())
            .unwrap()
            .rounded(2);
        assert_eq!(b.total.amount(), dec!(10.01));
    }
}
