//! # Inventory Adjuster
//!
//! Applies an invoice's line items to catalog stock, and reverses exactly
//! what was applied.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_invoice_create(invoice)        apply_invoice_delete(invoice_id)  │
//! │          │                                     │                        │
//! │          ▼                                     ▼                        │
//! │   for each line, in order:             for each line, in order:         │
//! │     find_by_name_or_id(item_id, name)    stock_item_id recorded?        │
//! │       ├── not found ──► skipped            ├── no ──► skipped           │
//! │       └── found ──► one transaction:       └── yes ──► one transaction: │
//! │             link line ──► item                   unlink line            │
//! │             quantity -= line.quantity            quantity += quantity   │
//! │                ├── ok ──► adjusted                  ├── ok ──► adjusted │
//! │                └── err ─► PartialInventoryFailure   └── err ─► same     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The recorded link is what makes delete the inverse of create: catalog
//! changes between the two (an item added, renamed or re-ided) cannot make
//! delete restore stock that create never took. Each line commits on its
//! own. When a failure interrupts the run, the lines already done stay done
//! and keep their links, so a retry only touches what is left.

use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error};

use crate::error::{DbError, DbResult};
use crate::repository::invoice::InvoiceRepository;
use crate::repository::item::ItemRepository;
use wrench_core::Invoice;

/// One applied stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAdjustment {
    pub item_id: String,
    /// Name on the invoice line.
    pub name: String,
    /// Signed quantity change that was applied.
    pub delta: i64,
}

/// Outcome of applying an invoice to stock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub adjusted: Vec<StockAdjustment>,
    /// Names of lines that moved no stock.
    pub skipped: Vec<String>,
}

#[derive(Debug, Error)]
pub enum InventoryError {
    /// The store failed partway through. `adjusted` lists the changes that
    /// were applied before `failed`.
    #[error(
        "inventory update failed at '{failed}' after {} adjustment(s): {source}",
        adjusted.len()
    )]
    PartialInventoryFailure {
        adjusted: Vec<StockAdjustment>,
        failed: String,
        #[source]
        source: DbError,
    },
}

impl InventoryError {
    /// The adjustments applied before the failure.
    pub fn adjusted(&self) -> &[StockAdjustment] {
        match self {
            InventoryError::PartialInventoryFailure { adjusted, .. } => adjusted,
        }
    }
}

/// Applies invoice line items to catalog quantities.
#[derive(Debug, Clone)]
pub struct InventoryAdjuster {
    pool: SqlitePool,
}

impl InventoryAdjuster {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryAdjuster { pool }
    }

    /// Decrements stock for every line of a newly stored invoice and links
    /// each line to the item it consumed.
    pub async fn apply_invoice_create(
        &self,
        invoice: &Invoice,
    ) -> Result<InventoryReport, InventoryError> {
        let items = ItemRepository::new(self.pool.clone());
        let mut report = InventoryReport::default();

        for (position, line) in invoice.items.iter().enumerate() {
            let found = items
                .find_by_name_or_id(line.item_id.as_deref(), &line.name)
                .await;

            let item = match found {
                Ok(Some(item)) => item,
                Ok(None) => {
                    debug!(name = %line.name, "No catalog item for line, skipping stock change");
                    report.skipped.push(line.name.clone());
                    continue;
                }
                Err(source) => return Err(fail(report.adjusted, &line.name, source)),
            };

            let delta = -line.quantity;
            let moved = self
                .move_stock(&invoice.id, position as i64, None, Some(item.id.as_str()), &item.id, delta)
                .await;

            match moved {
                Ok(true) => report.adjusted.push(StockAdjustment {
                    item_id: item.id,
                    name: line.name.clone(),
                    delta,
                }),
                Ok(false) => {
                    debug!(name = %line.name, "Line already linked, leaving stock as is");
                    report.skipped.push(line.name.clone());
                }
                Err(source) => return Err(fail(report.adjusted, &line.name, source)),
            }
        }

        debug!(
            adjusted = report.adjusted.len(),
            skipped = report.skipped.len(),
            "Invoice stock consumed"
        );
        Ok(report)
    }

    /// Restores the stock recorded against each line of a stored invoice
    /// and clears the links. Lines without a link are skipped, so nothing
    /// comes back that [`apply_invoice_create`](Self::apply_invoice_create)
    /// did not take.
    pub async fn apply_invoice_delete(
        &self,
        invoice_id: &str,
    ) -> Result<InventoryReport, InventoryError> {
        let links = InvoiceRepository::new(self.pool.clone())
            .stock_links(invoice_id)
            .await
            .map_err(|source| fail(Vec::new(), invoice_id, source))?;

        let mut report = InventoryReport::default();

        for link in links {
            let Some(item_id) = link.stock_item_id else {
                report.skipped.push(link.name);
                continue;
            };

            let delta = link.quantity;
            let moved = self
                .move_stock(invoice_id, link.position, Some(item_id.as_str()), None, &item_id, delta)
                .await;

            match moved {
                Ok(true) => report.adjusted.push(StockAdjustment {
                    item_id,
                    name: link.name,
                    delta,
                }),
                Ok(false) => {
                    debug!(name = %link.name, "Line stock already restored");
                    report.skipped.push(link.name);
                }
                Err(source) => return Err(fail(report.adjusted, &link.name, source)),
            }
        }

        debug!(
            adjusted = report.adjusted.len(),
            skipped = report.skipped.len(),
            "Invoice stock restored"
        );
        Ok(report)
    }

    /// Swaps one line's link and adjusts the item's quantity in a single
    /// transaction. Returns `false`, changing nothing, when the link did not
    /// hold `from`.
    async fn move_stock(
        &self,
        invoice_id: &str,
        position: i64,
        from: Option<&str>,
        to: Option<&str>,
        item_id: &str,
        delta: i64,
    ) -> DbResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        if !InvoiceRepository::swap_stock_link(&mut *tx, invoice_id, position, from, to).await? {
            return Ok(false);
        }
        ItemRepository::adjust_quantity(&mut *tx, item_id, delta).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(true)
    }
}

fn fail(adjusted: Vec<StockAdjustment>, failed: &str, source: DbError) -> InventoryError {
    error!(
        failed = %failed,
        ?adjusted,
        error = %source,
        "Partial inventory failure, manual reconciliation required"
    );
    InventoryError::PartialInventoryFailure {
        adjusted,
        failed: failed.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Utc;
    use uuid::Uuid;
    use wrench_core::{
        CustomerDetails, LineItem, Money, NewItem, PaymentMethod, PaymentStatus, Percent,
        TotalsSnapshot,
    };

    async fn stock(db: &Database, name: &str, quantity: i64) -> String {
        db.items()
            .insert(&NewItem {
                name: name.to_string(),
                price: Money::from_cents(1000),
                quantity,
            })
            .await
            .unwrap()
            .id
    }

    async fn quantity(db: &Database, id: &str) -> i64 {
        db.items().get_by_id(id).await.unwrap().unwrap().quantity
    }

    /// Stores an invoice with `lines` without touching stock.
    async fn store(db: &Database, lines: Vec<LineItem>) -> Invoice {
        let customer = db
            .customers()
            .find_or_create(&CustomerDetails {
                name: "Dana Reyes".to_string(),
                phone: "555-0101".to_string(),
                address: None,
            })
            .await
            .unwrap();

        let now = Utc::now();
        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: format!("INV-{}", &Uuid::new_v4().simple().to_string()[..8]),
            vin: None,
            year_model: None,
            customer_id: customer.id,
            items: lines,
            discount: Percent::zero(),
            tax: Percent::zero(),
            deposit: Money::zero(),
            refund_amount: Money::zero(),
            refund_reason: None,
            notes: None,
            payment_status: PaymentStatus::Paid,
            payment_method: PaymentMethod::Cash,
            totals: TotalsSnapshot::default(),
            created_at: now,
            updated_at: now,
        };
        db.invoices().insert(&invoice).await.unwrap();
        invoice
    }

    async fn lock_item(db: &Database, name: &str) {
        sqlx::query(&format!(
            "CREATE TRIGGER reject_locked BEFORE UPDATE ON items \
             WHEN NEW.name = '{name}' BEGIN SELECT RAISE(ABORT, 'stock locked'); END"
        ))
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn unlock_items(db: &Database) {
        sqlx::query("DROP TRIGGER reject_locked")
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pads = stock(&db, "Brake Pads", 5).await;
        let invoice = store(
            &db,
            vec![LineItem::new("Brake Pads", 3, Money::from_cents(5000)).with_item_id(&pads)],
        )
        .await;

        let created = db.inventory().apply_invoice_create(&invoice).await.unwrap();
        assert_eq!(quantity(&db, &pads).await, 2);
        assert_eq!(created.adjusted[0].delta, -3);

        let links = db.invoices().stock_links(&invoice.id).await.unwrap();
        assert_eq!(links[0].stock_item_id.as_deref(), Some(pads.as_str()));

        let deleted = db.inventory().apply_invoice_delete(&invoice.id).await.unwrap();
        assert_eq!(quantity(&db, &pads).await, 5);
        assert_eq!(deleted.adjusted[0].delta, 3);

        // Restoring twice is a no-op
        let again = db.inventory().apply_invoice_delete(&invoice.id).await.unwrap();
        assert!(again.adjusted.is_empty());
        assert_eq!(quantity(&db, &pads).await, 5);
    }

    #[tokio::test]
    async fn test_unknown_lines_are_skipped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let filter = stock(&db, "Oil Filter", 10).await;
        let invoice = store(
            &db,
            vec![
                LineItem::new("Labour", 2, Money::from_cents(8000)),
                // stale id, resolved by name
                LineItem::new("Oil Filter", 1, Money::from_cents(1200)).with_item_id("gone"),
            ],
        )
        .await;

        let report = db.inventory().apply_invoice_create(&invoice).await.unwrap();

        assert_eq!(report.skipped, vec!["Labour".to_string()]);
        assert_eq!(report.adjusted.len(), 1);
        assert_eq!(report.adjusted[0].item_id, filter);
        assert_eq!(quantity(&db, &filter).await, 9);
    }

    #[tokio::test]
    async fn test_item_added_after_create_is_not_restored() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let invoice = store(&db, vec![LineItem::new("Wiper", 2, Money::from_cents(1500))]).await;

        let created = db.inventory().apply_invoice_create(&invoice).await.unwrap();
        assert_eq!(created.skipped, vec!["Wiper".to_string()]);

        let wiper = stock(&db, "Wiper", 5).await;
        let deleted = db.inventory().apply_invoice_delete(&invoice.id).await.unwrap();

        assert!(deleted.adjusted.is_empty());
        assert_eq!(deleted.skipped, vec!["Wiper".to_string()]);
        assert_eq!(quantity(&db, &wiper).await, 5);
    }

    #[tokio::test]
    async fn test_restore_follows_recorded_item_after_rename() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pads = stock(&db, "Brake Pads", 5).await;
        let invoice = store(&db, vec![LineItem::new("Brake Pads", 2, Money::from_cents(5000))]).await;
        db.inventory().apply_invoice_create(&invoice).await.unwrap();

        // The old name now belongs to a different item
        db.items()
            .update(
                &pads,
                &wrench_core::ItemUpdate {
                    name: Some("Brake Pads (Front)".to_string()),
                    ..wrench_core::ItemUpdate::default()
                },
            )
            .await
            .unwrap();
        let newcomer = stock(&db, "Brake Pads", 7).await;

        db.inventory().apply_invoice_delete(&invoice.id).await.unwrap();
        assert_eq!(quantity(&db, &pads).await, 5);
        assert_eq!(quantity(&db, &newcomer).await, 7);
    }

    #[tokio::test]
    async fn test_oversell_goes_negative() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pads = stock(&db, "Brake Pads", 1).await;
        let invoice = store(&db, vec![LineItem::new("Brake Pads", 4, Money::from_cents(5000))]).await;

        db.inventory().apply_invoice_create(&invoice).await.unwrap();
        assert_eq!(quantity(&db, &pads).await, -3);
    }

    #[tokio::test]
    async fn test_failure_reports_applied_adjustments() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pads = stock(&db, "Brake Pads", 5).await;
        let broken = stock(&db, "Broken", 5).await;
        lock_item(&db, "Broken").await;

        let invoice = store(
            &db,
            vec![
                LineItem::new("Brake Pads", 2, Money::from_cents(5000)),
                LineItem::new("Broken", 1, Money::from_cents(100)),
                LineItem::new("Brake Pads", 1, Money::from_cents(5000)),
            ],
        )
        .await;
        let err = db.inventory().apply_invoice_create(&invoice).await.unwrap_err();

        let InventoryError::PartialInventoryFailure { adjusted, failed, .. } = &err;
        assert_eq!(failed, "Broken");
        assert_eq!(adjusted.len(), 1);
        assert_eq!(adjusted[0].item_id, pads);
        assert_eq!(quantity(&db, &pads).await, 3);
        assert_eq!(quantity(&db, &broken).await, 5);

        // Only the applied line is linked
        let links = db.invoices().stock_links(&invoice.id).await.unwrap();
        let linked: Vec<_> = links.iter().map(|l| l.stock_item_id.is_some()).collect();
        assert_eq!(linked, vec![true, false, false]);
    }

    #[tokio::test]
    async fn test_interrupted_restore_resumes_without_double_counting() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let pads = stock(&db, "Brake Pads", 5).await;
        let broken = stock(&db, "Broken", 5).await;
        let invoice = store(
            &db,
            vec![
                LineItem::new("Brake Pads", 2, Money::from_cents(5000)),
                LineItem::new("Broken", 1, Money::from_cents(100)),
            ],
        )
        .await;
        db.inventory().apply_invoice_create(&invoice).await.unwrap();
        assert_eq!(quantity(&db, &broken).await, 4);

        lock_item(&db, "Broken").await;
        let err = db.inventory().apply_invoice_delete(&invoice.id).await.unwrap_err();
        assert_eq!(err.adjusted().len(), 1);
        assert_eq!(quantity(&db, &pads).await, 5);

        unlock_items(&db).await;
        let resumed = db.inventory().apply_invoice_delete(&invoice.id).await.unwrap();
        assert_eq!(resumed.adjusted.len(), 1);
        assert_eq!(resumed.adjusted[0].item_id, broken);
        assert_eq!(quantity(&db, &pads).await, 5);
        assert_eq!(quantity(&db, &broken).await, 5);
    }
}
