//! # Error Types
//!
//! Domain-specific error types for wrench-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  wrench-core errors (this file)                                        │
//! │  ├── CoreError        - Calculation, numbering, rendering failures     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  wrench-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  ├── InventoryError   - Partial stock adjustment                       │
//! │  └── InvoiceError     - Lifecycle failures (wraps all of the above)    │
//! │                                                                         │
//! │  Server errors (apps/server)                                           │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → InvoiceError → ApiError → Client  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, line index, number)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item cannot be priced.
    ///
    /// ## When This Occurs
    /// - Quantity below 1
    /// - Negative unit price
    /// - Line total too large for cents
    /// - Blank description
    ///
    /// `index` is zero-based, in invoice order.
    #[error("Invalid line item {index}: {reason}")]
    InvalidLineItem { index: usize, reason: String },

    /// An invoice-level amount or percentage is outside its legal range.
    ///
    /// ## When This Occurs
    /// - Discount outside 0–100 %
    /// - Negative tax percentage
    /// - Negative deposit or refund amount
    #[error("{field} is out of range: {reason}")]
    InvalidRange { field: String, reason: String },

    /// A string does not follow the `INV-YYMM####` pattern.
    #[error("Invalid invoice number '{value}': {reason}")]
    InvalidInvoiceNumber { value: String, reason: String },

    /// The per-period sequence ran past what four digits can hold.
    ///
    /// ## When This Occurs
    /// More than 9999 invoices created in a single month.
    #[error("Invoice sequence exhausted for period {period} (value {value})")]
    SequenceExhausted { period: String, value: i64 },

    /// Document template failed to render.
    #[error("Document rendering failed: {0}")]
    Render(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidRange error.
    pub fn out_of_range(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidRange {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidLineItem error.
    pub fn line_item(index: usize, reason: impl Into<String>) -> Self {
        CoreError::InvalidLineItem {
            index,
            reason: reason.into(),
        }
    }

    /// Whether this error is caused by caller input (as opposed to a bug or
    /// an exhausted resource).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidLineItem { .. }
                | CoreError::InvalidRange { .. }
                | CoreError::InvalidInvoiceNumber { .. }
                | CoreError::Validation(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid phone).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
