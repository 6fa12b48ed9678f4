//! # Product Catalog
//!
//! Product lookups feed a line with a name, a price in the product's own
//! currency and optionally a tax rate. The catalog is owned elsewhere (the
//! product service); the editor only needs this read boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use tally_core::{Currency, Money, TaxRate};

/// What the catalog knows about a product at pick time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuote {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub currency: Currency,
    #[serde(default)]
    pub tax_rate: Option<TaxRate>,
}

/// Read access to products.
///
/// Lookups complete before any conversion or calculation for the line.
pub trait ProductCatalog {
    fn lookup(&self, product_id: &str) -> Option<ProductQuote>;
}

/// Catalog held in memory (tests, CLI price lists).
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: HashMap<String, ProductQuote>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a product.
    pub fn insert(&mut self, quote: ProductQuote) {
        self.products.insert(quote.id.clone(), quote);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl FromIterator<ProductQuote> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = ProductQuote>>(iter: I) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for quote in iter {
            catalog.insert(quote);
        }
        catalog
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn lookup(&self, product_id: &str) -> Option<ProductQuote> {
        self.products.get(product_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn widget() -> ProductQuote {
        ProductQuote {
            id: "SKU-1".into(),
            name: "Widget".into(),
            price: Money::new(dec!(10)),
            currency: Currency::Usd,
            tax_rate: Some(TaxRate::from_percent(dec!(10))),
        }
    }

    #[test]
    fn test_lookup() {
        let catalog: InMemoryCatalog = [widget()].into_iter().collect();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("SKU-1"), Some(widget()));
        assert_eq!(catalog.lookup("SKU-2"), None);
    }

    #[test]
    fn test_insert_replaces() {
        let mut catalog = InMemoryCatalog::new();
        catalog.insert(widget());
        let mut cheaper = widget();
        cheaper.price = Money::new(dec!(8));
        catalog.insert(cheaper);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("SKU-1").unwrap().price, Money::new(dec!(8)));
    }

    #[test]
    fn test_quote_json_without_tax_rate() {
        let json = r#"{"id":"A","name":"Apple","price":"2.50","currency":"EUR"}"#;
        let quote: ProductQuote = serde_json::from_str(json).unwrap();
        assert_eq!(quote.currency, Currency::Eur);
        assert_eq!(quote.tax_rate, None);
        assert_eq!(quote.price, Money::new(dec!(2.50)));
    }
}
