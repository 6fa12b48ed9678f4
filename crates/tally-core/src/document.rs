//! # Document Aggregation
//!
//! Folds every line of an invoice into the document summary and applies the
//! document-level discount.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  per line      gross, line discount, net, tax      (line::breakdown)   │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  subtotal      = Σ gross − Σ line discount                              │
//! │  candidate     = subtotal × v% (percentage)  |  v (amount)              │
//! │  discount      = min(candidate, subtotal)          ◄── clamp, not error │
//! │  tax base      = subtotal − discount                                    │
//! │  factor        = tax base ÷ subtotal   (0 when subtotal is 0)           │
//! │  tax total     = Σ line tax × factor                                    │
//! │  total         = tax base + tax total                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why scale the tax instead of re-taxing each line?
//! The global discount shrinks every line's tax by the same factor, so each
//! line keeps its nominal rate (20% stays 20%) while the reported tax still
//! drops in proportion to the discount.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::error::CoreResult;
use crate::line::{breakdown, LineBreakdown, LineInput};
use crate::money::{in_range, Money, HUNDRED};
use crate::types::{GlobalDiscount, GlobalDiscountKind, TaxPolicy, TaxRate};

/// Net amount and tax collected under one tax rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxBucket {
    pub rate: TaxRate,
    /// Σ line net at this rate, before the global discount.
    pub net: Money,
    /// Share of the tax base at this rate (net × factor).
    pub taxable: Money,
    /// Tax after scaling by the global discount factor.
    pub tax: Money,
}

/// The document summary shown under the line table and persisted on submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    pub lines: Vec<LineBreakdown>,
    pub gross_total: Money,
    pub line_discount_total: Money,
    pub subtotal: Money,
    pub discount_total: Money,
    pub tax_base: Money,
    #[ts(type = "string")]
    pub scaling_factor: Decimal,
    /// Σ line tax before the global discount.
    pub raw_tax_total: Money,
    pub tax_total: Money,
    pub total: Money,
    pub tax_buckets: Vec<TaxBucket>,
}

impl DocumentTotals {
    /// Totals of a document without lines.
    pub fn empty() -> Self {
        DocumentTotals {
            lines: Vec::new(),
            gross_total: Money::zero(),
            line_discount_total: Money::zero(),
            subtotal: Money::zero(),
            discount_total: Money::zero(),
            tax_base: Money::zero(),
            scaling_factor: Decimal::ZERO,
            raw_tax_total: Money::zero(),
            tax_total: Money::zero(),
            total: Money::zero(),
            tax_buckets: Vec::new(),
        }
    }

    /// Committed (display) form of the totals.
    ///
    /// The anchors `gross_total`, `subtotal`, `tax_base` and `tax_total` are
    /// rounded; the differences between them are derived from the rounded
    /// anchors so that `subtotal = gross − line discounts`,
    /// `tax_base = subtotal − discount` and `total = tax_base + tax` still
    /// hold to the cent.
    pub fn rounded(&self, scale: u32) -> DocumentTotals {
        let gross_total = self.gross_total.round_to(scale);
        let subtotal = self.subtotal.round_to(scale);
        let tax_base = self.tax_base.round_to(scale);
        let tax_total = self.tax_total.round_to(scale);

        // Anchors are bounded by the checked unrounded figures.
        DocumentTotals {
            lines: self.lines.iter().map(|l| l.rounded(scale)).collect(),
            gross_total,
            line_discount_total: gross_total.saturating_sub(subtotal),
            subtotal,
            discount_total: subtotal.saturating_sub(tax_base),
            tax_base,
            scaling_factor: self.scaling_factor,
            raw_tax_total: self.raw_tax_total.round_to(scale),
            tax_total,
            total: tax_base.saturating_add(tax_total),
            tax_buckets: self
                .tax_buckets
                .iter()
                .map(|b| TaxBucket {
                    rate: b.rate,
                    net: b.net.round_to(scale),
                    taxable: b.taxable.round_to(scale),
                    tax: b.tax.round_to(scale),
                })
                .collect(),
        }
    }
}

impl Default for DocumentTotals {
    fn default() -> Self {
        DocumentTotals::empty()
    }
}

/// Recomputes the whole document from its lines and global discount.
///
/// Pure and total: nothing is cached between calls. An invalid line, a
/// negative discount value or a sum past the `Decimal` range is reported as
/// a typed error and no totals are produced. An oversized discount is
/// clamped, never rejected.
pub fn recompute(
    lines: &[LineInput],
    discount: GlobalDiscount,
    policy: &TaxPolicy,
) -> CoreResult<DocumentTotals> {
    discount.validate()?;

    let breakdowns = lines
        .iter()
        .map(|line| breakdown(line, policy))
        .collect::<CoreResult<Vec<_>>>()?;

    let gross_total = sum_of(&breakdowns, |b| b.gross, "gross total")?;
    let line_discount_total = sum_of(&breakdowns, |b| b.discount_amount, "line discounts")?;
    let raw_tax_total = sum_of(&breakdowns, |b| b.tax, "tax total")?;
    let subtotal = in_range(gross_total.checked_sub(line_discount_total), "subtotal")?;

    // Anything from 100% up removes the whole subtotal.
    let candidate = match discount.kind {
        GlobalDiscountKind::Percentage => in_range(
            subtotal.checked_percent(discount.value.min(HUNDRED)),
            "global discount",
        )?,
        GlobalDiscountKind::Amount => Money::new(discount.value),
    };
    let discount_total = candidate.min(subtotal);
    let tax_base = in_range(subtotal.checked_sub(discount_total), "tax base")?;

    let scaling_factor = scaling_factor(tax_base, subtotal);
    let tax_total = in_range(raw_tax_total.checked_mul(scaling_factor), "tax total")?;
    let total = in_range(tax_base.checked_add(tax_total), "document total")?;

    let tax_buckets = bucket_by_rate(lines, &breakdowns, scaling_factor)?;

    Ok(DocumentTotals {
        lines: breakdowns,
        gross_total,
        line_discount_total,
        subtotal,
        discount_total,
        tax_base,
        scaling_factor,
        raw_tax_total,
        tax_total,
        total,
        tax_buckets,
    })
}

fn sum_of<F>(breakdowns: &[LineBreakdown], field: F, operation: &'static str) -> CoreResult<Money>
where
    F: Fn(&LineBreakdown) -> Money,
{
    in_range(Money::checked_sum(breakdowns.iter().map(field)), operation)
}

/// `tax_base / subtotal`, or zero when there is nothing to scale.
fn scaling_factor(tax_base: Money, subtotal: Money) -> Decimal {
    if !subtotal.is_positive() {
        return Decimal::ZERO;
    }
    tax_base
        .amount()
        .checked_div(subtotal.amount())
        .unwrap_or(Decimal::ZERO)
}

fn bucket_by_rate(
    lines: &[LineInput],
    breakdowns: &[LineBreakdown],
    factor: Decimal,
) -> CoreResult<Vec<TaxBucket>> {
    let mut buckets: BTreeMap<TaxRate, (Money, Money)> = BTreeMap::new();
    for (line, b) in lines.iter().zip(breakdowns) {
        let entry = buckets.entry(line.tax_rate).or_default();
        entry.0 = in_range(entry.0.checked_add(b.net), "tax bucket")?;
        entry.1 = in_range(entry.1.checked_add(b.tax), "tax bucket")?;
    }

    buckets
        .into_iter()
        .map(|(rate, (net, raw_tax))| -> CoreResult<TaxBucket> {
            Ok(TaxBucket {
                rate,
                net,
                taxable: in_range(net.checked_mul(factor), "tax bucket")?,
                tax: in_range(raw_tax.checked_mul(factor), "tax bucket")?,
            })
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
