//! # tally-editor: Invoice Editing Session
//!
//! Stateful layer between the invoice form and the pure pricing engine in
//! `tally-core`.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         tally-editor                                    │
//! │                                                                         │
//! │   ┌───────────┐     ┌────────────┐     ┌───────────────────────────┐   │
//! │   │ LineEdit  │────►│ apply_edit │────►│ InvoiceDraft              │   │
//! │   │ (event)   │     │ (reducer)  │     │  lines + discount + totals│   │
//! │   └───────────┘     └────────────┘     └─────────────┬─────────────┘   │
//! │                                                       │ finalize()      │
//! │   ┌───────────┐     ┌────────────┐     ┌─────────────▼─────────────┐   │
//! │   │ Catalog   │────►│ convert()  │     │ InvoiceSnapshot (rounded) │   │
//! │   └───────────┘     └────────────┘     └───────────────────────────┘   │
//! │                                                                         │
//! │   EngineConfig (engine.toml + TALLY_* env)     tracing (debug / warn)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`field`] - Live buffer vs committed value of one number
//! - [`edit`] - Line edit events
//! - [`line`] - Line drafts and the edit reducer
//! - [`catalog`] - Product lookup boundary
//! - [`draft`] - The invoice editing session
//! - [`quote`] - JSON quote requests (used by `tally-quote`)
//! - [`config`] - Engine configuration
//! - [`error`] - Editor error type
//!
//! ## Example
//!
//! ```rust
//! use tally_editor::{EditContext, InvoiceDraft, LineEdit};
//! use tally_core::{Currency, Money};
//! use rust_decimal_macros::dec;
//!
//! let mut draft = InvoiceDraft::new(Currency::Try, EditContext::default());
//! let line = draft.add_line().unwrap();
//! draft.apply_edit(&line, &LineEdit::Quantity("2".into())).unwrap();
//! draft.apply_edit(&line, &LineEdit::UnitPrice("100".into())).unwrap();
//! draft.apply_edit(&line, &LineEdit::DiscountRate("10".into())).unwrap();
//!
//! assert_eq!(draft.totals().total, Money::new(dec!(216)));
//! ```

pub mod catalog;
pub mod config;
pub mod draft;
pub mod edit;
pub mod error;
pub mod field;
pub mod line;
pub mod quote;

pub use catalog::{InMemoryCatalog, ProductCatalog, ProductQuote};
pub use config::EngineConfig;
pub use draft::{InvoiceDraft, InvoiceSnapshot, SnapshotLine};
pub use edit::{LineEdit, LineField};
pub use error::{EditorError, EditorResult, ErrorCode};
pub use field::NumericField;
pub use line::{apply_edit, commit_field, EditContext, FieldScales, LineDraft, TotalSource};
