//! # Editor Error Types
//!
//! Error type for the invoice editing session.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Editor Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Session      │  │    Pricing      │  │    Configuration        │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  LineNotFound   │  │  Core(...)      │  │  InvalidConfig          │ │
//! │  │  ProductNotFound│  │  (rejected edit)│  │  ConfigLoadFailed       │ │
//! │  │  EmptyDocument  │  │                 │  │  ConfigSaveFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A pricing error always means the edit was rejected and the draft is
//! exactly as it was before the call.

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for editor operations.
pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Debug, Error)]
pub enum EditorError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    /// No line with this id in the draft.
    #[error("Line not found: {0}")]
    LineNotFound(String),

    /// Catalog has no product with this id.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Finalizing a draft without lines.
    #[error("Invoice has no lines")]
    EmptyDocument,

    /// Request document could not be read or parsed.
    #[error("Failed to load document: {0}")]
    DocumentLoadFailed(String),

    // =========================================================================
    // Pricing Errors
    // =========================================================================
    /// The pricing engine refused the input.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration values are inconsistent.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for EditorError {
    fn from(err: ValidationError) -> Self {
        EditorError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        EditorError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EditorError {
    fn from(err: toml::de::Error) -> Self {
        EditorError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EditorError {
    fn from(err: toml::ser::Error) -> Self {
        EditorError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        EditorError::DocumentLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Codes (for the UI)
// =============================================================================

/// Machine-readable category the editor UI switches on.
///
/// ```typescript
/// switch (e.code) {
///   case 'INVALID_INPUT': markFieldInvalid(e.message); break;
///   case 'NOT_FOUND':     showNotification(e.message); break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Line or product does not exist.
    NotFound,
    /// A field value was rejected.
    InvalidInput,
    /// Currency conversion not possible with the configured rates.
    ExchangeRate,
    /// Draft cannot be finalized as is.
    BusinessLogic,
    /// Engine configuration problem.
    Config,
}

/// Serializable error body for UI consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl EditorError {
    /// Category of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            EditorError::LineNotFound(_) | EditorError::ProductNotFound(_) => ErrorCode::NotFound,
            EditorError::EmptyDocument => ErrorCode::BusinessLogic,
            EditorError::DocumentLoadFailed(_) => ErrorCode::InvalidInput,
            EditorError::Core(CoreError::MissingExchangeRate { .. }) => ErrorCode::ExchangeRate,
            EditorError::Core(_) => ErrorCode::InvalidInput,
            EditorError::InvalidConfig(_)
            | EditorError::ConfigLoadFailed(_)
            | EditorError::ConfigSaveFailed(_) => ErrorCode::Config,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        self.code() == ErrorCode::Config
    }

    /// Returns true if the pricing engine rejected a value.
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, EditorError::Core(_))
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}
