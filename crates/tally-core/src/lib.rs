//! # tally-core: Pure Pricing Logic for Tally Invoicing
//!
//! This crate is the **heart** of the invoice editor. It turns line edits
//! into consistent line and document figures, as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tally Invoicing Architecture                        │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Invoice Editor UI (external)                    │   │
//! │  │     Line table ──► Discount panel ──► Summary ──► Submit       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ LineEdit events                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tally-editor (session, config, logging)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │ currency │ │   line   │ │ reverse  │ │    document      │  │   │
//! │  │   │ convert  │ │ forward  │ │ resolve  │ │ discount + scale │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type over `rust_decimal::Decimal`
//! - [`types`] - Currency, rates, global discount, tax policy
//! - [`currency`] - Rate providers and one-rounding conversion
//! - [`line`] - Forward line calculation
//! - [`reverse`] - Unit price from an edited total
//! - [`document`] - Document totals with proportional tax scaling
//! - [`validation`] - Input rules shared by the calculators
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, every time
//! 2. **No I/O**: the rate table and catalog are supplied by the caller
//! 3. **Decimal Money**: no floating point anywhere in a calculation
//! 4. **Explicit Errors**: invalid input is a typed error, never NaN or a panic
//! 5. **Checked Arithmetic**: overflow is `CoreError::AmountOutOfRange`
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal_macros::dec;
//! use tally_core::document::recompute;
//! use tally_core::line::LineInput;
//! use tally_core::{DiscountRate, GlobalDiscount, Money, TaxPolicy, TaxRate};
//!
//! let lines = [LineInput::new(
//!     dec!(2),
//!     Money::new(dec!(100)),
//!     DiscountRate::from_percent(dec!(10)),
//!     TaxRate::from_percent(dec!(20)),
//! )];
//!
//! let totals = recompute(&lines, GlobalDiscount::none(), &TaxPolicy::default()).unwrap();
//! assert_eq!(totals.total, Money::new(dec!(216)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod currency;
pub mod document;
pub mod error;
pub mod line;
pub mod money;
pub mod reverse;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use currency::{convert, CurrencyConverter, RateProvider, StaticRateTable};
pub use document::{recompute, DocumentTotals, TaxBucket};
pub use error::{CoreError, CoreResult, ValidationError};
pub use line::{compute_total, LineBreakdown, LineInput};
pub use money::Money;
pub use reverse::resolve_unit_price;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Decimal places of committed money values.
pub const DEFAULT_AMOUNT_SCALE: u32 = 2;

/// Tax rate given to a freshly added line, in percent.
pub const DEFAULT_LINE_TAX_PERCENT: u32 = 20;
