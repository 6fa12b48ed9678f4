//! # Invoice Draft
//!
//! The editing session behind one open invoice form.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_line / remove_line / apply_edit / commit_field                     │
//! │  pick_product ──► convert() into document currency ──► reprice          │
//! │  set_currency ──► convert() every unit price        ──► reprice         │
//! │  set_global_discount                                                    │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │            recompute(all lines, discount)   (full, never incremental)   │
//! │                       │                                                 │
//! │          ok ──► lines + totals replaced together                        │
//! │          err ─► draft untouched, error returned                         │
//! │                                                                         │
//! │  finalize() ──► commit every field ──► InvoiceSnapshot (rounded)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - `totals()` always equals `recompute(lines, global_discount)`
//! - A failed operation leaves lines, discount, currency and totals as
//!   they were

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use tally_core::document::{recompute, DocumentTotals};
use tally_core::line::LineInput;
use tally_core::validation::parse_decimal;
use tally_core::{
    convert, Currency, DiscountRate, GlobalDiscount, GlobalDiscountKind, Money, RateProvider,
    TaxRate,
};

use crate::catalog::{ProductCatalog, ProductQuote};
use crate::edit::{LineEdit, LineField};
use crate::error::{EditorError, EditorResult};
use crate::line::{self, EditContext, LineDraft, TotalSource};

// =============================================================================
// Invoice Draft
// =============================================================================

/// An invoice being edited. Nothing here is persisted until [`finalize`].
///
/// [`finalize`]: InvoiceDraft::finalize
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    id: String,
    currency: Currency,
    lines: Vec<LineDraft>,
    global_discount: GlobalDiscount,
    totals: DocumentTotals,
    created_at: DateTime<Utc>,
    context: EditContext,
}

impl InvoiceDraft {
    /// Creates an empty draft in `currency`.
    pub fn new(currency: Currency, context: EditContext) -> Self {
        InvoiceDraft {
            id: Uuid::new_v4().to_string(),
            currency,
            lines: Vec::new(),
            global_discount: GlobalDiscount::none(),
            totals: DocumentTotals::empty(),
            created_at: Utc::now(),
            context,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Lines in display order.
    pub fn lines(&self) -> &[LineDraft] {
        &self.lines
    }

    pub fn line(&self, line_id: &str) -> Option<&LineDraft> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn global_discount(&self) -> GlobalDiscount {
        self.global_discount
    }

    /// Live (unrounded) document totals.
    pub fn totals(&self) -> &DocumentTotals {
        &self.totals
    }

    /// Totals rounded for the summary panel.
    pub fn display_totals(&self) -> DocumentTotals {
        self.totals.rounded(self.context.scales.amount)
    }

    pub fn context(&self) -> &EditContext {
        &self.context
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    // =========================================================================
    // Rows
    // =========================================================================

    /// Appends a blank row and returns its id.
    pub fn add_line(&mut self) -> EditorResult<String> {
        let line = LineDraft::blank(&self.context);
        let id = line.id.clone();

        let mut lines = self.lines.clone();
        lines.push(line);
        self.replace(lines, self.global_discount)?;

        debug!(draft_id = %self.id, line_id = %id, "Line added");
        Ok(id)
    }

    /// Removes a row.
    pub fn remove_line(&mut self, line_id: &str) -> EditorResult<()> {
        let index = self.index_of(line_id)?;
        let mut lines = self.lines.clone();
        lines.remove(index);
        self.replace(lines, self.global_discount)?;

        debug!(draft_id = %self.id, line_id, "Line removed");
        Ok(())
    }

    /// Applies one field edit to a row and recomputes the document.
    pub fn apply_edit(&mut self, line_id: &str, edit: &LineEdit) -> EditorResult<&LineDraft> {
        let index = self.index_of(line_id)?;
        let result = line::apply_edit(&self.lines[index], edit, &self.context)
            .and_then(|updated| self.replace_line(index, updated));

        match result {
            Ok(()) => {
                debug!(line_id, field = %edit.field(), input = edit.input(), "Line edited");
                Ok(&self.lines[index])
            }
            Err(e) => {
                warn!(line_id, field = %edit.field(), input = edit.input(), error = %e, "Edit rejected");
                Err(e)
            }
        }
    }

    /// Commits (rounds) one field of a row, e.g. when it loses focus.
    pub fn commit_field(&mut self, line_id: &str, field: LineField) -> EditorResult<&LineDraft> {
        let index = self.index_of(line_id)?;
        line::commit_field(&self.lines[index], field, &self.context)
            .and_then(|updated| self.replace_line(index, updated))
            .inspect_err(|e| warn!(line_id, field = %field, error = %e, "Commit rejected"))?;
        Ok(&self.lines[index])
    }

    // =========================================================================
    // Products and Currency
    // =========================================================================

    /// Fills a row from a product quote.
    ///
    /// The quoted price is converted into the document currency first, then
    /// the row is recomputed forward. A missing rate rejects the pick.
    pub fn pick_product<R>(&mut self, line_id: &str, quote: &ProductQuote, rates: &R) -> EditorResult<&LineDraft>
    where
        R: RateProvider + ?Sized,
    {
        let index = self.index_of(line_id)?;
        let price = self.reprice_from_quote(index, quote, rates).inspect_err(|e| {
            warn!(
                line_id,
                product_id = %quote.id,
                from = %quote.currency,
                to = %self.currency,
                error = %e,
                "Product pick rejected"
            )
        })?;

        debug!(
            line_id,
            product_id = %quote.id,
            from = %quote.currency,
            to = %self.currency,
            price = %price,
            "Product picked"
        );
        Ok(&self.lines[index])
    }

    fn reprice_from_quote<R>(&mut self, index: usize, quote: &ProductQuote, rates: &R) -> EditorResult<Money>
    where
        R: RateProvider + ?Sized,
    {
        let price = convert(
            quote.price,
            quote.currency,
            self.currency,
            rates,
            self.context.scales.amount,
        )?;

        let mut updated = line::reprice(&self.lines[index], price, quote.tax_rate, &self.context)?;
        updated.product_id = Some(quote.id.clone());
        updated.description = Some(quote.name.clone());
        self.replace_line(index, updated)?;
        Ok(price)
    }

    /// Looks the product up, then picks it.
    pub fn pick_from_catalog<R>(
        &mut self,
        line_id: &str,
        product_id: &str,
        catalog: &dyn ProductCatalog,
        rates: &R,
    ) -> EditorResult<&LineDraft>
    where
        R: RateProvider + ?Sized,
    {
        let quote = catalog
            .lookup(product_id)
            .ok_or_else(|| EditorError::ProductNotFound(product_id.to_string()))?;
        self.pick_product(line_id, &quote, rates)
    }

    /// Switches the document currency, converting every unit price.
    ///
    /// Either every line converts or nothing changes. Converted lines are
    /// recomputed forward, so a manually typed total is re-derived.
    pub fn set_currency<R>(&mut self, currency: Currency, rates: &R) -> EditorResult<()>
    where
        R: RateProvider + ?Sized,
    {
        if currency == self.currency {
            return Ok(());
        }

        let scale = self.context.scales.amount;
        let lines = self
            .lines
            .iter()
            .map(|l| {
                let price = convert(Money::new(l.unit_price.live()), self.currency, currency, rates, scale)?;
                line::reprice(l, price, None, &self.context)
            })
            .collect::<EditorResult<Vec<_>>>()
            .inspect_err(|e| warn!(from = %self.currency, to = %currency, error = %e, "Currency change rejected"))?;

        self.replace(lines, self.global_discount)?;
        info!(draft_id = %self.id, from = %self.currency, to = %currency, "Document currency changed");
        self.currency = currency;
        Ok(())
    }

    // =========================================================================
    // Global Discount
    // =========================================================================

    pub fn set_global_discount(&mut self, discount: GlobalDiscount) -> EditorResult<()> {
        self.replace(self.lines.clone(), discount)
            .inspect_err(|e| warn!(error = %e, "Global discount rejected"))?;
        debug!(kind = ?discount.kind, value = %discount.value, "Global discount set");
        Ok(())
    }

    /// Sets the global discount from what was typed into the discount box.
    pub fn set_global_discount_input(&mut self, kind: GlobalDiscountKind, text: &str) -> EditorResult<()> {
        let value = parse_decimal(text, "globalDiscountValue")?;
        self.set_global_discount(GlobalDiscount { kind, value })
    }

    // =========================================================================
    // Finalize
    // =========================================================================

    /// Commits every field and produces the figures to persist.
    ///
    /// The draft itself is not changed.
    pub fn finalize(&self) -> EditorResult<InvoiceSnapshot> {
        if self.lines.is_empty() {
            return Err(EditorError::EmptyDocument);
        }

        let lines = self
            .lines
            .iter()
            .map(|l| line::commit_all(l, &self.context))
            .collect::<EditorResult<Vec<_>>>()?;

        let scale = self.context.scales.amount;
        let totals = recompute(&inputs(&lines), self.global_discount, &self.context.policy)?.rounded(scale);

        let snapshot_lines = lines
            .iter()
            .zip(&totals.lines)
            .map(|(l, b)| SnapshotLine {
                id: l.id.clone(),
                product_id: l.product_id.clone(),
                description: l.description.clone(),
                quantity: l.quantity.committed(),
                unit_price: Money::new(l.unit_price.committed()),
                discount_rate: DiscountRate::from_percent(l.discount_rate.committed()),
                tax_rate: TaxRate::from_percent(l.tax_rate.committed()),
                total: b.total,
                total_source: l.total_source,
            })
            .collect();

        info!(draft_id = %self.id, lines = lines.len(), total = %totals.total, "Invoice finalized");

        Ok(InvoiceSnapshot {
            id: self.id.clone(),
            currency: self.currency,
            global_discount: self.global_discount,
            lines: snapshot_lines,
            totals,
            created_at: self.created_at,
            finalized_at: Utc::now(),
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn index_of(&self, line_id: &str) -> EditorResult<usize> {
        self.lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| EditorError::LineNotFound(line_id.to_string()))
    }

    fn replace_line(&mut self, index: usize, updated: LineDraft) -> EditorResult<()> {
        let mut lines = self.lines.clone();
        lines[index] = updated;
        self.replace(lines, self.global_discount)
    }

    /// Recomputes with the new state and swaps it in only on success.
    fn replace(&mut self, lines: Vec<LineDraft>, discount: GlobalDiscount) -> EditorResult<()> {
        let totals = recompute(&inputs(&lines), discount, &self.context.policy)?;
        self.lines = lines;
        self.global_discount = discount;
        self.totals = totals;
        Ok(())
    }
}

fn inputs(lines: &[LineDraft]) -> Vec<LineInput> {
    lines.iter().map(LineDraft::input).collect()
}

// =============================================================================
// Snapshot
// =============================================================================

/// A committed line, as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotLine {
    pub id: String,
    pub product_id: Option<String>,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub quantity: Decimal,
    pub unit_price: Money,
    pub discount_rate: DiscountRate,
    pub tax_rate: TaxRate,
    pub total: Money,
    pub total_source: TotalSource,
}

/// A finalized invoice: committed lines and rounded totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSnapshot {
    pub id: String,
    pub currency: Currency,
    pub global_discount: GlobalDiscount,
    pub lines: Vec<SnapshotLine>,
    pub totals: DocumentTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub finalized_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
