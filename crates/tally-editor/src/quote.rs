//! # Quote Requests
//!
//! A whole invoice described as JSON, replayed through an [`InvoiceDraft`]
//! exactly as the editor would have built it, and finalized.
//!
//! ```json
//! {
//!   "currency": "TRY",
//!   "globalDiscount": { "kind": "percentage", "value": "10" },
//!   "lines": [
//!     { "quantity": "2", "unitPrice": "100", "discountRate": "10" },
//!     { "productId": "SKU-1", "quantity": "3" },
//!     { "quantity": "1", "total": "120" }
//!   ]
//! }
//! ```
//!
//! Line values are the text a user would type. Per line, a product pick
//! runs first, then the fields in the order quantity, unit price, discount,
//! tax, and last the total (which derives the unit price).

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use tally_core::{Currency, GlobalDiscount, RateProvider};

use crate::catalog::{InMemoryCatalog, ProductCatalog, ProductQuote};
use crate::draft::{InvoiceDraft, InvoiceSnapshot};
use crate::edit::{LineEdit, LineField};
use crate::error::{EditorError, EditorResult};
use crate::line::EditContext;

/// One line of a quote request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub unit_price: Option<String>,
    #[serde(default)]
    pub discount_rate: Option<String>,
    #[serde(default)]
    pub tax_rate: Option<String>,
    #[serde(default)]
    pub total: Option<String>,
}

impl QuoteLine {
    /// Field edits in replay order.
    pub fn edits(&self) -> Vec<LineEdit> {
        [
            (LineField::Quantity, &self.quantity),
            (LineField::UnitPrice, &self.unit_price),
            (LineField::DiscountRate, &self.discount_rate),
            (LineField::TaxRate, &self.tax_rate),
            (LineField::Total, &self.total),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_ref().map(|v| LineEdit::new(field, v.as_str())))
        .collect()
    }
}

/// An invoice to price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Document currency; the configured default when absent.
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub global_discount: GlobalDiscount,
    pub lines: Vec<QuoteLine>,
}

/// Builds and finalizes the invoice a request describes.
pub fn build_quote<R>(
    request: &QuoteRequest,
    context: EditContext,
    default_currency: Currency,
    rates: &R,
    catalog: Option<&dyn ProductCatalog>,
) -> EditorResult<InvoiceSnapshot>
where
    R: RateProvider + ?Sized,
{
    let currency = request.currency.unwrap_or(default_currency);
    let mut draft = InvoiceDraft::new(currency, context);

    for (index, line) in request.lines.iter().enumerate() {
        let line_id = draft.add_line()?;

        if let Some(product_id) = &line.product_id {
            let catalog =
                catalog.ok_or_else(|| EditorError::ProductNotFound(product_id.clone()))?;
            draft.pick_from_catalog(&line_id, product_id, catalog, rates)?;
        }

        for edit in line.edits() {
            draft.apply_edit(&line_id, &edit)?;
        }
        debug!(index, line_id = %line_id, "Quote line replayed");
    }

    draft.set_global_discount(request.global_discount)?;
    draft.finalize()
}

// =============================================================================
// File Loading
// =============================================================================

/// Reads a quote request from a JSON file.
pub fn load_request(path: &Path) -> EditorResult<QuoteRequest> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| EditorError::DocumentLoadFailed(format!("{}: {}", path.display(), e)))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Reads a product list (JSON array of quotes) into a catalog.
pub fn load_catalog(path: &Path) -> EditorResult<InMemoryCatalog> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| EditorError::DocumentLoadFailed(format!("{}: {}", path.display(), e)))?;
    let products: Vec<ProductQuote> = serde_json::from_str(&contents)?;
    Ok(products.into_iter().collect())
}
