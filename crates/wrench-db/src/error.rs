//! # Database Errors
//!
//! What can go wrong below the invoice lifecycle, sorted by what a caller
//! does about it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                                                            │
//! │     ├── UNIQUE constraint   ──► UniqueViolation  (taken number, name)   │
//! │     ├── FOREIGN KEY         ──► ForeignKeyViolation                     │
//! │     ├── CHECK / trigger     ──► QueryFailed                             │
//! │     ├── pool closed/timeout ──► Unavailable                             │
//! │     └── anything else       ──► QueryFailed                             │
//! │                                                                         │
//! │  InvoiceService wraps these in InvoiceError; apps/server maps both to   │
//! │  HTTP statuses.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` holds the constraint columns as SQLite reports them, such as
    /// `invoices.invoice_number` or `customers.name, customers.phone`.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// A row points at a customer or invoice that is not stored.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// The database file cannot be opened, or the pool is closed or has no
    /// free connection.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// The statement was rejected: a CHECK constraint, a trigger abort, or
    /// bad SQL.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether this is a unique violation on the given `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }

    /// Fills in the offending value of a UniqueViolation, which SQLite does
    /// not report.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.into(),
            },
            other => other,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    // "UNIQUE constraint failed: <table>.<column>[, ...]"
                    ErrorKind::UniqueViolation => DbError::duplicate(
                        message
                            .split("UNIQUE constraint failed: ")
                            .nth(1)
                            .unwrap_or("unknown"),
                        "unknown",
                    ),
                    ErrorKind::ForeignKeyViolation => {
                        DbError::ForeignKeyViolation(message.to_string())
                    }
                    _ => DbError::QueryFailed(message.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::Unavailable("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),
            sqlx::Error::Io(e) => DbError::Unavailable(e.to_string()),

            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
