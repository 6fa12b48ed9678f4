//! # Numeric Field Buffers
//!
//! Every editable number on an invoice line has two states:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  typing "12.5"                                                          │
//! │     raw       = "12.5"      ← exactly what the user sees while typing   │
//! │     live      = 12.5        ← unrounded, used by every calculation      │
//! │     committed = (previous)                                              │
//! │                                                                         │
//! │  commit()  (field blur / finalize)                                      │
//! │     committed = 12.50       ← rounded to the field's scale              │
//! │     live      = 12.50                                                   │
//! │     raw       = "12.50"                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keeping both avoids the value snapping to `12.50` mid-keystroke.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_core::money::round_half_up;
use tally_core::validation::{parse_decimal, ValidationResult};
use ts_rs::TS;

/// One editable number with a live buffer and a committed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NumericField {
    raw: String,
    #[ts(type = "string")]
    live: Decimal,
    #[ts(type = "string")]
    committed: Decimal,
    scale: u32,
}

impl NumericField {
    /// A committed field holding `value` rounded to `scale`.
    pub fn new(value: Decimal, scale: u32) -> Self {
        let committed = round_half_up(value, scale);
        NumericField {
            raw: format_fixed(committed, scale),
            live: committed,
            committed,
            scale,
        }
    }

    /// Parses typed text into the live value.
    ///
    /// On a parse failure nothing changes and the previous value stays.
    pub fn input(&mut self, text: &str, field: &str) -> ValidationResult<Decimal> {
        let value = parse_decimal(text, field)?;
        self.set_live(text, value);
        Ok(value)
    }

    /// Stores what the user typed and its parsed value. No rounding.
    pub fn set_live(&mut self, raw: impl Into<String>, value: Decimal) {
        self.raw = raw.into();
        self.live = value;
    }

    /// Stores a value calculated by the engine (e.g., a forward total).
    pub fn set_derived(&mut self, value: Decimal) {
        self.raw = value.normalize().to_string();
        self.live = value;
    }

    /// Rounds the live value and makes it the committed value.
    pub fn commit(&mut self) -> Decimal {
        self.committed = round_half_up(self.live, self.scale);
        self.live = self.committed;
        self.raw = format_fixed(self.committed, self.scale);
        self.committed
    }

    /// Rounds for display only; the live value keeps full precision.
    ///
    /// Used for a unit price derived from a typed total, so the total the
    /// user typed still holds exactly.
    pub fn commit_display(&mut self) -> Decimal {
        self.committed = round_half_up(self.live, self.scale);
        self.raw = format_fixed(self.committed, self.scale);
        self.committed
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn live(&self) -> Decimal {
        self.live
    }

    pub fn committed(&self) -> Decimal {
        self.committed
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// True when the live value differs from its rounded, committed form.
    pub fn is_dirty(&self) -> bool {
        self.live != self.committed || round_half_up(self.live, self.scale) != self.live
    }
}

/// Formats `value` with exactly `scale` decimals ("12.5" → "12.50").
pub fn format_fixed(value: Decimal, scale: u32) -> String {
    let mut rounded = round_half_up(value, scale);
    rounded.rescale(scale);
    rounded.to_string()
}
