//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Wrench POS                             │
//! │                                                                         │
//! │  Handler: Result<T, ApiError>                                          │
//! │       │                                                                 │
//! │       ├── CoreError (input)        ──► 400 VALIDATION_ERROR            │
//! │       ├── DbError::NotFound        ──► 404 NOT_FOUND                   │
//! │       ├── InvoiceNotFound          ──► 404 NOT_FOUND                   │
//! │       ├── DbError::UniqueViolation ──► 409 CONFLICT                    │
//! │       ├── DuplicateInvoiceNumber   ──► 409 CONFLICT                    │
//! │       ├── PartialInventory         ──► 500 INVENTORY_ERROR             │
//! │       └── anything else            ──► 500 DATABASE_ERROR / INTERNAL   │
//! │                                                                         │
//! │  Response body:                                                         │
//! │  { "code": "NOT_FOUND", "message": "Invoice not found: 3f2a..." }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use wrench_core::{CoreError, ValidationError};
use wrench_db::{DbError, InventoryError, InvoiceError};

/// API error returned from handlers.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Duplicate key (409)
    Conflict,

    /// Stock was only partly applied (500)
    InventoryError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InventoryError | ErrorCode::DatabaseError | ErrorCode::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation(message) => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::Unavailable(e) => {
                tracing::error!("Database unavailable: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database unavailable")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_input_error() {
            return ApiError::validation(err.to_string());
        }
        match err {
            CoreError::SequenceExhausted { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            other => {
                tracing::error!("Core error: {}", other);
                ApiError::internal(other.to_string())
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts invoice lifecycle errors to API errors.
impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::Core(e) => e.into(),
            InvoiceError::Db(e) => e.into(),
            InvoiceError::InvoiceNotFound(id) => ApiError::not_found("Invoice", &id),
            InvoiceError::DuplicateInvoiceNumber(number) => ApiError::new(
                ErrorCode::Conflict,
                format!("Invoice number {} is already in use, try again", number),
            ),
            InvoiceError::PartialInventory { invoice_id, source } => {
                let InventoryError::PartialInventoryFailure { adjusted, failed, .. } = &source;
                let applied: Vec<String> = adjusted
                    .iter()
                    .map(|a| format!("{} ({:+})", a.name, a.delta))
                    .collect();
                ApiError::new(
                    ErrorCode::InventoryError,
                    format!(
                        "Inventory update for invoice {} failed at '{}'; already applied: [{}]",
                        invoice_id,
                        failed,
                        applied.join(", ")
                    ),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wrench_db::StockAdjustment;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = InvoiceError::InvoiceNotFound("abc".to_string()).into();
        assert_eq!(not_found.code.status(), StatusCode::NOT_FOUND);

        let duplicate: ApiError = DbError::duplicate("items.name", "Oil Filter").into();
        assert_eq!(duplicate.code, ErrorCode::Conflict);

        let invalid: ApiError = CoreError::line_item(0, "quantity must be positive").into();
        assert_eq!(invalid.code.status(), StatusCode::BAD_REQUEST);

        let exhausted: ApiError = InvoiceError::Core(CoreError::SequenceExhausted {
            period: "2610".to_string(),
            value: 10_000,
        })
        .into();
        assert_eq!(exhausted.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_partial_inventory_lists_adjusted_items() {
        let err: ApiError = InvoiceError::PartialInventory {
            invoice_id: "inv-1".to_string(),
            source: InventoryError::PartialInventoryFailure {
                adjusted: vec![StockAdjustment {
                    item_id: "item-1".to_string(),
                    name: "Brake Pads".to_string(),
                    delta: -2,
                }],
                failed: "Rotor".to_string(),
                source: DbError::QueryFailed("locked".to_string()),
            },
        }
        .into();

        assert_eq!(err.code.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.contains("Brake Pads (-2)"));
        assert!(err.message.contains("'Rotor'"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Invoice", "abc")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Invoice not found: abc");
    }
}
