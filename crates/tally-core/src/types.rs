//! # Domain Types
//!
//! Value types shared by every pricing component.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Currency     │   │    TaxRate      │   │  DiscountRate   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  TRY (base)     │   │  percent        │   │  percent        │       │
//! │  │  USD            │   │  20 = 20%       │   │  [0, 100]       │       │
//! │  │  EUR            │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────────────┐   ┌─────────────────────────────┐         │
//! │  │    GlobalDiscount       │   │        TaxPolicy            │         │
//! │  │  ─────────────────────  │   │  ─────────────────────────  │         │
//! │  │  kind: percentage|amount│   │  Fixed([0, 1, 10, 20])      │         │
//! │  │  value: >= 0            │   │  AnyPercentage              │         │
//! │  └─────────────────────────┘   └─────────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::HUNDRED;

// =============================================================================
// Currency
// =============================================================================

/// Currencies an invoice can be issued in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Turkish lira.
    #[default]
    Try,
    /// US dollar.
    Usd,
    /// Euro.
    Eur,
}

impl Currency {
    /// Every supported currency, in display order.
    pub const ALL: [Currency; 3] = [Currency::Try, Currency::Usd, Currency::Eur];

    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Try => "TRY",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRY" | "TL" => Ok(Currency::Try),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: Currency::ALL.iter().map(|c| c.code().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a percentage (20 = 20%).
///
/// Whether a given rate may be used on an invoice is decided by
/// [`TaxPolicy`], not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(#[ts(type = "string")] Decimal);

impl TaxRate {
    /// Creates a tax rate from a percentage.
    #[inline]
    pub const fn from_percent(percent: Decimal) -> Self {
        TaxRate(percent)
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a fraction (20% → 0.2).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        self.0 / HUNDRED
    }

    /// Multiplier applied to a net amount (20% → 1.2).
    #[inline]
    pub fn gross_up_factor(&self) -> Decimal {
        Decimal::ONE + self.fraction()
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Line-level discount as a percentage in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(#[ts(type = "string")] Decimal);

impl DiscountRate {
    /// Creates a discount rate from a percentage.
    #[inline]
    pub const fn from_percent(percent: Decimal) -> Self {
        DiscountRate(percent)
    }

    /// Returns the rate as a percentage.
    #[inline]
    pub const fn percent(&self) -> Decimal {
        self.0
    }

    /// Share of the gross amount that remains after the discount
    /// (10% → 0.9).
    #[inline]
    pub fn remaining_fraction(&self) -> Decimal {
        Decimal::ONE - self.0 / HUNDRED
    }

    /// A 100% discount cannot be inverted.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.0 == HUNDRED
    }

    /// No discount.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(Decimal::ZERO)
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Global (document-level) Discount
// =============================================================================

/// How the document-level discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GlobalDiscountKind {
    /// Value is a percentage of the subtotal.
    #[default]
    Percentage,
    /// Value is an absolute amount in the document currency.
    Amount,
}

impl FromStr for GlobalDiscountKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "percentage" | "percent" | "%" => Ok(GlobalDiscountKind::Percentage),
            "amount" | "fixed" => Ok(GlobalDiscountKind::Amount),
            _ => Err(ValidationError::NotAllowed {
                field: "global discount type".to_string(),
                allowed: vec!["percentage".to_string(), "amount".to_string()],
            }),
        }
    }
}

/// Document-level discount applied after line discounts.
///
/// An amount larger than the subtotal is not an error: the aggregator clamps
/// it so the tax base never goes negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDiscount {
    pub kind: GlobalDiscountKind,
    #[ts(type = "string")]
    pub value: Decimal,
}

impl GlobalDiscount {
    /// No document-level discount.
    pub const fn none() -> Self {
        GlobalDiscount {
            kind: GlobalDiscountKind::Percentage,
            value: Decimal::ZERO,
        }
    }

    /// Percentage of the subtotal.
    pub const fn percentage(value: Decimal) -> Self {
        GlobalDiscount {
            kind: GlobalDiscountKind::Percentage,
            value,
        }
    }

    /// Absolute amount.
    pub const fn amount(value: Decimal) -> Self {
        GlobalDiscount {
            kind: GlobalDiscountKind::Amount,
            value,
        }
    }

    /// Rejects negative values.
    pub fn validate(&self) -> CoreResult<()> {
        if self.value < Decimal::ZERO {
            return Err(CoreError::InvalidGlobalDiscount { value: self.value });
        }
        Ok(())
    }
}

// =============================================================================
// Tax Policy
// =============================================================================

/// Tax rates selectable in the invoice editor by default.
pub const DEFAULT_TAX_RATES: [u32; 4] = [0, 1, 10, 20];

/// Which tax rates a line may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxPolicy {
    /// Only the listed rates are accepted.
    Fixed(Vec<TaxRate>),
    /// Any percentage in [0, 100].
    AnyPercentage,
}

impl TaxPolicy {
    /// Policy accepting exactly the given percentages.
    pub fn fixed<I: IntoIterator<Item = Decimal>>(rates: I) -> Self {
        let mut rates: Vec<TaxRate> = rates.into_iter().map(TaxRate::from_percent).collect();
        rates.sort();
        rates.dedup();
        TaxPolicy::Fixed(rates)
    }

    /// Checks that `rate` may be used on a line.
    pub fn check(&self, rate: TaxRate) -> CoreResult<()> {
        let accepted = match self {
            TaxPolicy::Fixed(allowed) => allowed.contains(&rate),
            TaxPolicy::AnyPercentage => rate.percent() >= Decimal::ZERO && rate.percent() <= HUNDRED,
        };

        if accepted {
            Ok(())
        } else {
            Err(CoreError::InvalidTaxRate {
                rate: rate.percent(),
                allowed: self.allowed_percents(),
            })
        }
    }

    /// Allowed percentages, empty for [`TaxPolicy::AnyPercentage`].
    pub fn allowed_percents(&self) -> Vec<Decimal> {
        match self {
            TaxPolicy::Fixed(allowed) => allowed.iter().map(TaxRate::percent).collect(),
            TaxPolicy::AnyPercentage => Vec::new(),
        }
    }
}

impl Default for TaxPolicy {
    fn default() -> Self {
        TaxPolicy::fixed(DEFAULT_TAX_RATES.iter().map(|r| Decimal::from(*r)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
