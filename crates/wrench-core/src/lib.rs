//! # wrench-core: Pure Business Logic for Wrench POS
//!
//! This crate is the **heart** of Wrench POS. It contains the invoice
//! arithmetic, numbering rules, validation, and document rendering as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Wrench POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  HTTP API (apps/server, axum)                   │   │
//! │  │   /api/invoices, /api/items, /api/customers, /api/settings     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           wrench-db (SQLite, inventory, invoice lifecycle)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ wrench-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌───────────┐ ┌──────────┐ ┌────────┐ │   │
//! │  │  │  money  │ │ totals  │ │ numbering │ │validation│ │document│ │   │
//! │  │  │ Money   │ │ Invoice │ │ INV-YYMM  │ │  rules   │ │ HTML   │ │   │
//! │  │  │ Percent │ │ Totals  │ │  ####     │ │  checks  │ │ PDF    │ │   │
//! │  │  └─────────┘ └─────────┘ └───────────┘ └──────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money (integer cents), Percent (parts per million), exact carry
//! - [`types`] - Domain types (Invoice, LineItem, Customer, Item, settings)
//! - [`totals`] - The Total Calculator
//! - [`numbering`] - Invoice number format `INV-YYMM####`
//! - [`validation`] - Field validation rules
//! - [`document`] - Invoice document model and the HTML/PDF renderers
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use wrench_core::money::{Money, Percent};
//! use wrench_core::totals::{Adjustments, InvoiceTotals};
//! use wrench_core::types::LineItem;
//!
//! let items = vec![LineItem::new("Brake pads", 2, Money::from_cents(5000))];
//! let adjustments = Adjustments {
//!     discount: Percent::from_bps(1000), // 10%
//!     tax: Percent::from_bps(800),       // 8%
//!     deposit: Money::from_cents(2000),
//!     refund_amount: Money::zero(),
//! };
//!
//! let totals = InvoiceTotals::calculate(&items, &adjustments).unwrap();
//! assert_eq!(totals.subtotal().cents(), 10000);
//! assert_eq!(totals.tax_amount().cents(), 720);
//! assert_eq!(totals.grand_total().cents(), 7720);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod money;
pub mod numbering;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percent};
pub use numbering::{InvoiceNumber, NumberPeriod};
pub use totals::{Adjustments, InvoiceTotals, TotalsSnapshot};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items on a single invoice.
pub const MAX_LINE_ITEMS: usize = 200;

/// Prefix of every generated invoice number.
pub const INVOICE_NUMBER_PREFIX: &str = "INV-";
