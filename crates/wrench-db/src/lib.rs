//! # wrench-db: Database Layer for Wrench POS
//!
//! SQLite persistence for the Wrench POS invoicing backend, plus the parts
//! of the invoice lifecycle that need the database.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Wrench POS Data Flow                             │
//! │                                                                         │
//! │  HTTP handler (apps/server)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     wrench-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌────────────────┐  │   │
//! │  │   │ InvoiceService│──►│ InventoryAdj.  │   │  Migrations    │  │   │
//! │  │   │ (service.rs)  │   │ (inventory.rs) │   │  (embedded)    │  │   │
//! │  │   └───────┬───────┘   └───────┬────────┘   └────────────────┘  │   │
//! │  │           ▼                   ▼                                 │   │
//! │  │   ┌─────────────────────────────────────┐   ┌───────────────┐  │   │
//! │  │   │ Repositories                        │──►│   Database    │  │   │
//! │  │   │ customer, item, invoice,            │   │   (pool.rs)   │  │   │
//! │  │   │ settings, counter                   │   │  SqlitePool   │  │   │
//! │  │   └─────────────────────────────────────┘   └───────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`inventory`] - Inventory Adjuster (stock changes per invoice)
//! - [`service`] - Invoice lifecycle service
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wrench_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/wrench.db")).await?;
//!
//! let settings = db.settings().get_or_init().await?;
//! let created = db.invoice_service().create(request, &settings).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inventory;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use inventory::{InventoryAdjuster, InventoryError, InventoryReport, StockAdjustment};
pub use pool::{Database, DbConfig};
pub use service::{InvoiceError, InvoiceResult, InvoiceService};

// Repository re-exports for convenience
pub use repository::counter::CounterRepository;
pub use repository::customer::CustomerRepository;
pub use repository::invoice::{InvoiceFilter, InvoiceRepository};
pub use repository::item::ItemRepository;
pub use repository::settings::SettingsRepository;
