//! # Invoice Service
//!
//! The invoice lifecycle: create, read, search, amend payment, render, and
//! delete.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewInvoice + ShopSettings                                             │
//! │       │                                                                 │
//! │       ▼  into_draft(): defaults, trimming, Total Calculator            │
//! │       │  (fails here ⇒ nothing written, no number consumed)            │
//! │       ▼                                                                 │
//! │  customers.find_or_create(name, phone)                                 │
//! │       │                                                                 │
//! │       ▼  ┌──────────────── up to MAX_NUMBER_ATTEMPTS ───────────────┐  │
//! │       │  │ counters.next_value(YYMM) ──► INV-YYMM####               │  │
//! │       │  │ invoices.insert() (one transaction: invoice + lines)      │  │
//! │       │  │   └── duplicate invoice_number ──► warn, next value       │  │
//! │       │  └───────────────────────────────────────────────────────────┘  │
//! │       ▼                                                                 │
//! │  inventory.apply_invoice_create(invoice) ──► lines linked to items     │
//! │       │  (after the write: a rejected number never touches stock)      │
//! │       ▼                                                                 │
//! │  CreatedInvoice { id, invoice_number, totals }                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Delete
//! Look up (`InvoiceNotFound` before any stock change), restore the stock
//! recorded against each line, then remove the record. If restoring stock
//! fails partway the record is kept, and a retry restores only the lines
//! still linked.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DbError;
use crate::inventory::{InventoryError, InventoryReport};
use crate::pool::Database;
use crate::repository::invoice::InvoiceFilter;
use wrench_core::document::{self, InvoiceDocument};
use wrench_core::validation::{clamp_limit, validate_search_query};
use wrench_core::{
    CoreError, CreatedInvoice, Customer, Invoice, InvoiceNumber, Item, NewInvoice, NumberPeriod,
    PaymentAmendment, ResolvedInvoice, ShopProfile, ShopSettings,
};

/// Numbers tried per creation before giving up with `DuplicateInvoiceNumber`.
pub const MAX_NUMBER_ATTEMPTS: u32 = 3;

pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 200;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Validation or calculation failure. Nothing was written.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// The store rejected every number tried.
    #[error("Invoice number {0} is already in use")]
    DuplicateInvoiceNumber(String),

    /// Stock was only partly applied. For a create the invoice exists; for
    /// a delete it was kept.
    #[error("Invoice {invoice_id}: {source}")]
    PartialInventory {
        invoice_id: String,
        #[source]
        source: InventoryError,
    },
}

pub type InvoiceResult<T> = Result<T, InvoiceError>;

// =============================================================================
// Service
// =============================================================================

/// Invoice lifecycle operations over one [`Database`].
///
/// ## Usage
/// ```rust,ignore
/// let settings = db.settings().get_or_init().await?;
/// let created = db.invoice_service().create(request, &settings).await?;
/// let pdf = db.invoice_service().render_pdf(&created.id, &shop).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceService {
    db: Database,
}

impl InvoiceService {
    pub fn new(db: Database) -> Self {
        InvoiceService { db }
    }

    /// Creates an invoice.
    ///
    /// Discount, tax, payment method and payment status missing from
    /// `request` come from `settings`.
    ///
    /// ## Errors
    /// - `Core` on invalid input (nothing written)
    /// - `DuplicateInvoiceNumber` after `MAX_NUMBER_ATTEMPTS` rejected numbers
    /// - `PartialInventory` when stock was only partly applied (the invoice
    ///   is stored)
    pub async fn create(
        &self,
        request: NewInvoice,
        settings: &ShopSettings,
    ) -> InvoiceResult<CreatedInvoice> {
        let draft = request.into_draft(settings)?;
        let customer = self.db.customers().find_or_create(&draft.customer).await?;

        let mut invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: String::new(),
            vin: draft.vin,
            year_model: draft.year_model,
            customer_id: customer.id,
            items: draft.items,
            discount: draft.adjustments.discount,
            tax: draft.adjustments.tax,
            deposit: draft.adjustments.deposit,
            refund_amount: draft.adjustments.refund_amount,
            refund_reason: draft.refund_reason,
            notes: draft.notes,
            payment_status: draft.payment_status,
            payment_method: draft.payment_method,
            totals: draft.totals,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            let now = Utc::now();
            let period = NumberPeriod::from_date(&now);
            let sequence = self.db.counters().next_value(&period).await?;
            let number = InvoiceNumber::format(period, sequence)?;

            invoice.invoice_number = number.to_string();
            invoice.created_at = now;
            invoice.updated_at = now;

            match self.db.invoices().insert(&invoice).await {
                Ok(()) => break,
                Err(err) if err.is_unique_violation_on("invoices.invoice_number") => {
                    if attempt >= MAX_NUMBER_ATTEMPTS {
                        return Err(InvoiceError::DuplicateInvoiceNumber(number.to_string()));
                    }
                    warn!(
                        invoice_number = %number,
                        attempt,
                        "Invoice number already taken, retrying with next value"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        let report = self
            .db
            .inventory()
            .apply_invoice_create(&invoice)
            .await
            .map_err(|source| InvoiceError::PartialInventory {
                invoice_id: invoice.id.clone(),
                source,
            })?;

        info!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            grand_total = %invoice.totals.grand_total,
            stock_adjusted = report.adjusted.len(),
            "Invoice created"
        );

        Ok(CreatedInvoice {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            totals: invoice.totals,
        })
    }

    /// Deletes an invoice and restores the stock it consumed.
    pub async fn delete(&self, id: &str) -> InvoiceResult<InventoryReport> {
        let invoice = self.get(id).await?;

        let report = self
            .db
            .inventory()
            .apply_invoice_delete(&invoice.id)
            .await
            .map_err(|source| InvoiceError::PartialInventory {
                invoice_id: invoice.id.clone(),
                source,
            })?;

        if !self.db.invoices().delete_by_id(id).await? {
            // Lost a race with another delete of the same invoice. Each line's
            // stock was still restored once, by whichever caller cleared it.
            warn!(id = %id, "Invoice vanished before delete");
        } else {
            info!(
                id = %id,
                invoice_number = %invoice.invoice_number,
                stock_restored = report.adjusted.len(),
                "Invoice deleted"
            );
        }

        Ok(report)
    }

    pub async fn get(&self, id: &str) -> InvoiceResult<Invoice> {
        self.db
            .invoices()
            .get_by_id(id)
            .await?
            .ok_or_else(|| InvoiceError::InvoiceNotFound(id.to_string()))
    }

    /// The invoice with its customer and the catalog items its lines still
    /// point at (by id, else by name). Lines whose item is gone contribute
    /// nothing to `catalog`.
    pub async fn resolve(&self, id: &str) -> InvoiceResult<ResolvedInvoice> {
        let invoice = self.get(id).await?;
        let customer = self.customer_of(&invoice).await?;

        let items = self.db.items();
        let mut catalog: Vec<Item> = Vec::new();
        for line in &invoice.items {
            if let Some(item) = items
                .find_by_name_or_id(line.item_id.as_deref(), &line.name)
                .await?
            {
                if !catalog.iter().any(|known| known.id == item.id) {
                    catalog.push(item);
                }
            }
        }

        Ok(ResolvedInvoice {
            invoice,
            customer,
            catalog,
        })
    }

    /// Invoices matching `filter`, newest first.
    pub async fn search(&self, filter: &InvoiceFilter) -> InvoiceResult<Vec<Invoice>> {
        let mut filter = filter.clone();
        if let Some(text) = &filter.text {
            filter.text = Some(validate_search_query(text).map_err(CoreError::from)?);
        }
        if let Some(name) = &filter.customer_name {
            filter.customer_name = Some(validate_search_query(name).map_err(CoreError::from)?);
        }

        let limit = clamp_limit(filter.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(self.db.invoices().find(&filter, limit).await?)
    }

    /// Newest invoices first.
    pub async fn list(&self, limit: Option<i64>) -> InvoiceResult<Vec<Invoice>> {
        let limit = clamp_limit(limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
        Ok(self.db.invoices().list(limit).await?)
    }

    /// Changes payment status and/or the refund of a stored invoice and
    /// refreshes its totals snapshot.
    pub async fn amend_payment(
        &self,
        id: &str,
        amendment: &PaymentAmendment,
    ) -> InvoiceResult<Invoice> {
        let current = self.get(id).await?;

        let mut amended = amendment.apply(&current)?;
        amended.updated_at = Utc::now();

        match self.db.invoices().update_payment(&amended).await {
            Ok(()) => {}
            Err(DbError::NotFound { .. }) => {
                return Err(InvoiceError::InvoiceNotFound(id.to_string()))
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            id = %id,
            status = amended.payment_status.as_str(),
            refund = %amended.refund_amount,
            grand_total = %amended.totals.grand_total,
            "Invoice payment amended"
        );
        Ok(amended)
    }

    /// Builds the document model shared by both renderers.
    pub async fn document(&self, id: &str, shop: &ShopProfile) -> InvoiceResult<InvoiceDocument> {
        let invoice = self.get(id).await?;
        let customer = self.customer_of(&invoice).await?;
        Ok(InvoiceDocument::build(&invoice, &customer, shop)?)
    }

    pub async fn render_html(&self, id: &str, shop: &ShopProfile) -> InvoiceResult<String> {
        let doc = self.document(id, shop).await?;
        Ok(document::render_html(&doc)?)
    }

    pub async fn render_pdf(&self, id: &str, shop: &ShopProfile) -> InvoiceResult<Vec<u8>> {
        let doc = self.document(id, shop).await?;
        Ok(document::render_pdf(&doc))
    }

    async fn customer_of(&self, invoice: &Invoice) -> InvoiceResult<Customer> {
        self.db
            .customers()
            .get_by_id(&invoice.customer_id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", &invoice.customer_id).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;
    use wrench_core::{CustomerDetails, LineItem, Money, PaymentMethod, PaymentStatus, Percent};

    fn request(items: Vec<LineItem>) -> NewInvoice {
        NewInvoice {
            vin: Some("1HGCM82633A004352".to_string()),
            year_model: Some("2012 Civic".to_string()),
            customer: CustomerDetails {
                name: "Dana Reyes".to_string(),
                phone: "555-0101".to_string(),
                address: None,
            },
            items,
            discount: None,
            tax: None,
            deposit: None,
            refund_amount: None,
            refund_reason: None,
            notes: None,
            payment_status: None,
            payment_method: None,
        }
    }

    #[tokio::test]
    async fn test_defaults_come_from_settings() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = ShopSettings {
            tax: Percent::from_bps(800),
            discount: Percent::from_bps(1000),
            payment_method: PaymentMethod::Cheque,
            payment_status: PaymentStatus::Unpaid,
        };

        let mut req = request(vec![LineItem::new("Brake Pads", 2, Money::from_cents(5000))]);
        req.deposit = Some(Money::from_cents(2000));
        let created = db.invoice_service().create(req, &settings).await.unwrap();

        assert_eq!(created.totals.grand_total, Money::from_cents(7720));

        let stored = db.invoice_service().get(&created.id).await.unwrap();
        assert_eq!(stored.payment_method, PaymentMethod::Cheque);
        assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
        assert_eq!(stored.tax, Percent::from_bps(800));
    }

    #[tokio::test]
    async fn test_invalid_request_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let req = request(vec![LineItem::new("Brake Pads", 0, Money::from_cents(5000))]);
        let err = db
            .invoice_service()
            .create(req, &ShopSettings::default())
            .await
            .unwrap_err();

        assert!(matches!(err, InvoiceError::Core(CoreError::InvalidLineItem { index: 0, .. })));
        assert_eq!(db.invoices().count_all().await.unwrap(), 0);
        assert!(db.customers().list(10).await.unwrap().is_empty());
        let period = NumberPeriod::from_date(&Utc::now());
        assert_eq!(db.counters().current_value(&period).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_and_delete_unknown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = db.invoice_service();
        let id = Uuid::new_v4().to_string();

        assert!(matches!(
            service.get(&id).await.unwrap_err(),
            InvoiceError::InvoiceNotFound(_)
        ));
        assert!(matches!(
            service.delete(&id).await.unwrap_err(),
            InvoiceError::InvoiceNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_amend_payment_recomputes_totals() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = db.invoice_service();

        let created = service
            .create(
                request(vec![LineItem::new("Labour", 1, Money::from_cents(10000))]),
                &ShopSettings::default(),
            )
            .await
            .unwrap();

        let amended = service
            .amend_payment(
                &created.id,
                &PaymentAmendment {
                    payment_status: Some(PaymentStatus::Unpaid),
                    refund_amount: Some(Money::from_cents(2500)),
                    refund_reason: Some("Goodwill".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(amended.totals.grand_total, Money::from_cents(7500));
        let stored = service.get(&created.id).await.unwrap();
        assert_eq!(stored.totals.grand_total, Money::from_cents(7500));
        assert_eq!(stored.payment_status, PaymentStatus::Unpaid);
        assert!(stored.updated_at >= stored.created_at);

        let negative = PaymentAmendment {
            refund_amount: Some(Money::from_cents(-1)),
            ..PaymentAmendment::default()
        };
        let err = service.amend_payment(&created.id, &negative).await.unwrap_err();
        assert!(matches!(err, InvoiceError::Core(CoreError::InvalidRange { .. })));
    }

    #[tokio::test]
    async fn test_resolve_lists_catalog_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pads = db
            .items()
            .insert(&wrench_core::NewItem {
                name: "Brake Pads".to_string(),
                price: Money::from_cents(5000),
                quantity: 5,
            })
            .await
            .unwrap();

        let created = db
            .invoice_service()
            .create(
                request(vec![
                    LineItem::new("Brake Pads", 1, Money::from_cents(5000)).with_item_id(&pads.id),
                    LineItem::new("Brake Pads", 1, Money::from_cents(5000)),
                    LineItem::new("Labour", 1, Money::from_cents(8000)),
                ]),
                &ShopSettings::default(),
            )
            .await
            .unwrap();

        let resolved = db.invoice_service().resolve(&created.id).await.unwrap();
        assert_eq!(resolved.customer.name, "Dana Reyes");
        assert_eq!(resolved.catalog.len(), 1);
        assert_eq!(resolved.catalog[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_rendered_documents_share_figures() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = db.invoice_service();
        let shop = ShopProfile::default();

        let mut req = request(vec![LineItem::new("Brake Pads", 2, Money::from_cents(5000))]);
        req.discount = Some(10.0);
        req.tax = Some(8.0);
        req.deposit = Some(Money::from_cents(2000));
        let created = service.create(req, &ShopSettings::default()).await.unwrap();

        let html = service.render_html(&created.id, &shop).await.unwrap();
        let pdf = service.render_pdf(&created.id, &shop).await.unwrap();
        let pdf_text = String::from_utf8_lossy(&pdf);

        for figure in ["$100.00", "$7.20", "$77.20"] {
            assert!(html.contains(figure), "html missing {figure}");
            assert!(pdf_text.contains(figure), "pdf missing {figure}");
        }
        assert!(html.contains(&created.invoice_number));
        assert_eq!(pdf, service.render_pdf(&created.id, &shop).await.unwrap());
    }
}
