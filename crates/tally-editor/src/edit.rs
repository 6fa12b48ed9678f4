//! # Line Edit Events
//!
//! Every change the UI makes to a line arrives as one [`LineEdit`]:
//!
//! ```text
//! { "kind": "quantity",     "value": "3"     }   ─┐
//! { "kind": "unitPrice",    "value": "12,5"  }    ├─► forward: total recomputed
//! { "kind": "discountRate", "value": "10"    }    │
//! { "kind": "taxRate",      "value": "20"    }   ─┘
//! { "kind": "total",        "value": "216"   }   ───► reverse: unit price resolved
//! ```
//!
//! The value is the raw text of the field, so the live buffer shows exactly
//! what was typed.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// The editable fields of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum LineField {
    Quantity,
    UnitPrice,
    DiscountRate,
    TaxRate,
    Total,
}

impl LineField {
    pub const ALL: [LineField; 5] = [
        LineField::Quantity,
        LineField::UnitPrice,
        LineField::DiscountRate,
        LineField::TaxRate,
        LineField::Total,
    ];

    /// Field name used in validation messages.
    pub const fn label(&self) -> &'static str {
        match self {
            LineField::Quantity => "quantity",
            LineField::UnitPrice => "unitPrice",
            LineField::DiscountRate => "discountRate",
            LineField::TaxRate => "taxRate",
            LineField::Total => "total",
        }
    }

    /// True for fields that drive the forward calculation.
    pub fn is_forward(&self) -> bool {
        !matches!(self, LineField::Total)
    }
}

impl fmt::Display for LineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One keystroke or selection on a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum LineEdit {
    Quantity(String),
    UnitPrice(String),
    DiscountRate(String),
    TaxRate(String),
    Total(String),
}

impl LineEdit {
    pub fn new(field: LineField, input: impl Into<String>) -> Self {
        let input = input.into();
        match field {
            LineField::Quantity => LineEdit::Quantity(input),
            LineField::UnitPrice => LineEdit::UnitPrice(input),
            LineField::DiscountRate => LineEdit::DiscountRate(input),
            LineField::TaxRate => LineEdit::TaxRate(input),
            LineField::Total => LineEdit::Total(input),
        }
    }

    pub fn field(&self) -> LineField {
        match self {
            LineEdit::Quantity(_) => LineField::Quantity,
            LineEdit::UnitPrice(_) => LineField::UnitPrice,
            LineEdit::DiscountRate(_) => LineField::DiscountRate,
            LineEdit::TaxRate(_) => LineField::TaxRate,
            LineEdit::Total(_) => LineField::Total,
        }
    }

    /// The raw text typed into the field.
    pub fn input(&self) -> &str {
        match self {
            LineEdit::Quantity(s)
            | LineEdit::UnitPrice(s)
            | LineEdit::DiscountRate(s)
            | LineEdit::TaxRate(s)
            | LineEdit::Total(s) => s,
        }
    }
}
