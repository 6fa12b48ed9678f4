//! # Line Drafts
//!
//! One row of the invoice form while it is being edited, and the pure
//! reducer that applies a [`LineEdit`] to it.
//!
//! ## Edit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_edit(line, edit, ctx) ──► new LineDraft   (or error, line kept)  │
//! │                                                                         │
//! │  Quantity / UnitPrice / DiscountRate / TaxRate                          │
//! │     field.input(text) ──► compute_total() ──► total.set_derived()       │
//! │     total_source = Computed                                             │
//! │                                                                         │
//! │  Total                                                                  │
//! │     total.input(text) ──► resolve_unit_price() ──► price.set_derived()  │
//! │     total_source = Manual   (the typed total is kept as is)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Commit Rules
//! Committing rounds a field to its scale. If rounding changes a forward
//! field, the line is recomputed forward. A committed `Total` in manual mode
//! re-resolves the unit price from the rounded total. A unit price derived
//! from a manual total is rounded for display only, so the total holds.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use tally_core::line::{compute_total, LineInput};
use tally_core::reverse::resolve_unit_price;
use tally_core::{
    DiscountRate, Money, TaxPolicy, TaxRate, DEFAULT_AMOUNT_SCALE, DEFAULT_LINE_TAX_PERCENT,
};

use crate::edit::{LineEdit, LineField};
use crate::error::EditorResult;
use crate::field::NumericField;

// =============================================================================
// Edit Context
// =============================================================================

/// Decimal places each kind of field is committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldScales {
    pub amount: u32,
    pub quantity: u32,
    pub rate: u32,
}

impl Default for FieldScales {
    fn default() -> Self {
        FieldScales {
            amount: DEFAULT_AMOUNT_SCALE,
            quantity: 2,
            rate: 2,
        }
    }
}

/// Pricing rules every line edit is checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct EditContext {
    pub policy: TaxPolicy,
    /// Tax rate of a newly added row.
    pub default_tax_rate: TaxRate,
    pub scales: FieldScales,
}

impl Default for EditContext {
    fn default() -> Self {
        EditContext {
            policy: TaxPolicy::default(),
            default_tax_rate: TaxRate::from_percent(Decimal::from(DEFAULT_LINE_TAX_PERCENT)),
            scales: FieldScales::default(),
        }
    }
}

// =============================================================================
// Line Draft
// =============================================================================

/// Where the line total currently comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum TotalSource {
    /// Calculated forward from the other four fields.
    #[default]
    Computed,
    /// Typed by the user; the unit price was derived from it.
    Manual,
}

/// An invoice row being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineDraft {
    pub id: String,
    pub product_id: Option<String>,
    pub description: Option<String>,
    pub quantity: NumericField,
    pub unit_price: NumericField,
    pub discount_rate: NumericField,
    pub tax_rate: NumericField,
    pub total: NumericField,
    pub total_source: TotalSource,
}

impl LineDraft {
    /// A new row: quantity 1, price 0, no discount, the default tax rate.
    pub fn blank(ctx: &EditContext) -> Self {
        let scales = ctx.scales;
        LineDraft {
            id: Uuid::new_v4().to_string(),
            product_id: None,
            description: None,
            quantity: NumericField::new(Decimal::ONE, scales.quantity),
            unit_price: NumericField::new(Decimal::ZERO, scales.amount),
            discount_rate: NumericField::new(Decimal::ZERO, scales.rate),
            tax_rate: NumericField::new(ctx.default_tax_rate.percent(), scales.rate),
            total: NumericField::new(Decimal::ZERO, scales.amount),
            total_source: TotalSource::Computed,
        }
    }

    /// The live figures of this line, as the calculators see them.
    pub fn input(&self) -> LineInput {
        LineInput::new(
            self.quantity.live(),
            Money::new(self.unit_price.live()),
            DiscountRate::from_percent(self.discount_rate.live()),
            TaxRate::from_percent(self.tax_rate.live()),
        )
    }

    pub fn field(&self, field: LineField) -> &NumericField {
        match field {
            LineField::Quantity => &self.quantity,
            LineField::UnitPrice => &self.unit_price,
            LineField::DiscountRate => &self.discount_rate,
            LineField::TaxRate => &self.tax_rate,
            LineField::Total => &self.total,
        }
    }

    fn field_mut(&mut self, field: LineField) -> &mut NumericField {
        match field {
            LineField::Quantity => &mut self.quantity,
            LineField::UnitPrice => &mut self.unit_price,
            LineField::DiscountRate => &mut self.discount_rate,
            LineField::TaxRate => &mut self.tax_rate,
            LineField::Total => &mut self.total,
        }
    }

    /// Recalculates the total from the other fields.
    fn recompute_forward(&mut self, ctx: &EditContext) -> EditorResult<()> {
        let total = compute_total(&self.input(), &ctx.policy)?;
        self.total.set_derived(total.amount());
        self.total_source = TotalSource::Computed;
        Ok(())
    }

    /// Derives the unit price from the current total.
    fn resolve_from_total(&mut self, ctx: &EditContext) -> EditorResult<()> {
        let price = resolve_unit_price(
            Money::new(self.total.live()),
            self.quantity.live(),
            DiscountRate::from_percent(self.discount_rate.live()),
            TaxRate::from_percent(self.tax_rate.live()),
            &ctx.policy,
        )?;
        self.unit_price.set_derived(price.amount());
        self.total_source = TotalSource::Manual;
        Ok(())
    }
}

// =============================================================================
// Reducers
// =============================================================================

/// Applies one edit and returns the updated line.
///
/// On error the input line is untouched and the caller keeps it.
pub fn apply_edit(line: &LineDraft, edit: &LineEdit, ctx: &EditContext) -> EditorResult<LineDraft> {
    let field = edit.field();
    let mut next = line.clone();
    next.field_mut(field).input(edit.input(), field.label())?;

    if field.is_forward() {
        next.recompute_forward(ctx)?;
    } else {
        next.resolve_from_total(ctx)?;
    }
    Ok(next)
}

/// Rounds one field to its committed value (e.g., on blur).
pub fn commit_field(line: &LineDraft, field: LineField, ctx: &EditContext) -> EditorResult<LineDraft> {
    let mut next = line.clone();
    let manual = next.total_source == TotalSource::Manual;

    match field {
        LineField::Total if manual => {
            next.total.commit();
            next.resolve_from_total(ctx)?;
        }
        LineField::Total => {
            next.total.commit_display();
        }
        LineField::UnitPrice if manual => {
            next.unit_price.commit_display();
        }
        _ => {
            let before = next.field(field).live();
            let after = next.field_mut(field).commit();
            if before != after {
                next.recompute_forward(ctx)?;
            }
        }
    }
    Ok(next)
}

/// Commits every field of the line, in dependency order.
pub fn commit_all(line: &LineDraft, ctx: &EditContext) -> EditorResult<LineDraft> {
    [
        LineField::Quantity,
        LineField::DiscountRate,
        LineField::TaxRate,
        LineField::Total,
        LineField::UnitPrice,
    ]
    .into_iter()
    .try_fold(line.clone(), |acc, field| commit_field(&acc, field, ctx))
}

/// Replaces the unit price (and optionally the tax rate) and recomputes
/// forward. Used by product picks and currency changes.
pub fn reprice(
    line: &LineDraft,
    unit_price: Money,
    tax_rate: Option<TaxRate>,
    ctx: &EditContext,
) -> EditorResult<LineDraft> {
    let mut next = line.clone();
    next.unit_price.set_derived(unit_price.amount());
    next.unit_price.commit();
    if let Some(rate) = tax_rate {
        next.tax_rate.set_derived(rate.percent());
        next.tax_rate.commit();
    }
    next.recompute_forward(ctx)?;
    Ok(next)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use tally_core::CoreError;

    fn ctx() -> EditContext {
        EditContext::default()
    }

    fn edit(line: &LineDraft, field: LineField, text: &str) -> LineDraft {
        apply_edit(line, &LineEdit::new(field, text), &ctx()).unwrap()
    }

    /// 2 × 100, 10% off, 20% tax.
    fn example_line() -> LineDraft {
        let line = LineDraft::blank(&ctx());
        let line = edit(&line, LineField::Quantity, "2");
        let line = edit(&line, LineField::UnitPrice, "100");
        edit(&line, LineField::DiscountRate, "10")
    }

    #[test]
    fn test_blank_line() {
        let line = LineDraft::blank(&ctx());
        assert_eq!(line.quantity.live(), dec!(1));
        assert_eq!(line.unit_price.live(), dec!(0));
        assert_eq!(line.discount_rate.live(), dec!(0));
        assert_eq!(line.tax_rate.live(), dec!(20));
        assert_eq!(line.total.live(), dec!(0));
        assert_eq!(line.total_source, TotalSource::Computed);
        assert_ne!(line.id, LineDraft::blank(&ctx()).id);
    }

    #[test]
    fn test_forward_edit_recomputes_total() {
        let line = example_line();
        assert_eq!(line.total.live(), dec!(216));
        assert_eq!(line.total_source, TotalSource::Computed);
    }

    #[test]
    fn test_total_edit_resolves_unit_price() {
        let line = edit(&example_line(), LineField::Total, "216.00");
        assert_eq!(line.unit_price.live(), dec!(100));
        assert_eq!(line.total.raw(), "216.00");
        assert_eq!(line.total_source, TotalSource::Manual);
    }

    #[test]
    fn test_live_values_are_not_rounded() {
        let line = edit(&example_line(), LineField::Total, "100");
        // 100 / 1.2 / 0.9 / 2
        assert!(line.unit_price.live().scale() > 2);
        assert_eq!(line.total.live(), dec!(100));
    }

    #[test]
    fn test_rejected_edit_leaves_line_unchanged() {
        let line = example_line();
        let ctx = ctx();

        let err = apply_edit(&line, &LineEdit::Quantity("0".into()), &ctx).unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::InvalidQuantity { .. })));

        let err = apply_edit(&line, &LineEdit::TaxRate("18".into()), &ctx).unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::InvalidTaxRate { .. })));

        let err = apply_edit(&line, &LineEdit::UnitPrice("1.2.3".into()), &ctx).unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_full_discount_rejects_total_edit() {
        let line = edit(&example_line(), LineField::DiscountRate, "100");
        assert_eq!(line.total.live(), dec!(0));

        let err = apply_edit(&line, &LineEdit::Total("50".into()), &ctx()).unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::InvalidDiscountRate { .. })));
    }

    #[test]
    fn test_negative_total_is_rejected() {
        let err = apply_edit(&example_line(), &LineEdit::Total("-5".into()), &ctx()).unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::InvalidLineTotal { .. })));
    }

    #[test]
    fn test_forward_edit_after_manual_total() {
        let line = edit(&example_line(), LineField::Total, "100");
        let line = edit(&line, LineField::Quantity, "4");
        assert_eq!(line.total_source, TotalSource::Computed);
        assert_eq!(line.total.live().round_dp(2), dec!(200.00));
    }

    #[test]
    fn test_commit_forward_field_recomputes_when_rounded() {
        let line = edit(&example_line(), LineField::UnitPrice, "100.004");
        assert_eq!(line.total.live(), dec!(216.00864));

        let line = commit_field(&line, LineField::UnitPrice, &ctx()).unwrap();
        assert_eq!(line.unit_price.live(), dec!(100.00));
        assert_eq!(line.total.live(), dec!(216));
    }

    #[test]
    fn test_commit_manual_total_keeps_typed_total() {
        let line = edit(&example_line(), LineField::Total, "100");
        let line = commit_all(&line, &ctx()).unwrap();

        assert_eq!(line.total_source, TotalSource::Manual);
        assert_eq!(line.total.committed(), dec!(100.00));
        assert_eq!(line.unit_price.committed(), dec!(46.30));
        assert_eq!(line.unit_price.raw(), "46.30");
        // display rounding only
        assert!(line.unit_price.live() != dec!(46.30));
    }

    #[test]
    fn test_commit_quantity_to_zero_is_rejected() {
        let line = edit(&example_line(), LineField::Quantity, "0.001");
        let err = commit_field(&line, LineField::Quantity, &ctx()).unwrap_err();
        assert!(matches!(err, EditorError::Core(CoreError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_reprice_sets_price_and_tax() {
        let line = reprice(
            &example_line(),
            Money::new(dec!(50)),
            Some(TaxRate::from_percent(dec!(10))),
            &ctx(),
        )
        .unwrap();
        assert_eq!(line.unit_price.live(), dec!(50.00));
        assert_eq!(line.tax_rate.live(), dec!(10.00));
        // 2 × 50 × 0.9 × 1.1
        assert_eq!(line.total.live(), dec!(99));
    }

    proptest! {
        #[test]
        fn prop_total_edit_round_trips(
            q in 1i64..10_000,
            d in 0i64..9_900,
            total in 0i64..10_000_000,
        ) {
            let line = LineDraft::blank(&ctx());
            let line = edit(&line, LineField::Quantity, &Decimal::new(q, 2).to_string());
            let line = edit(&line, LineField::DiscountRate, &Decimal::new(d, 2).to_string());
            let typed = Decimal::new(total, 2);
            let line = edit(&line, LineField::Total, &typed.to_string());

            let forward = compute_total(&line.input(), &ctx().policy).unwrap();
            prop_assert!((forward.amount() - typed).abs() <= dec!(0.01));
        }
    }
}
