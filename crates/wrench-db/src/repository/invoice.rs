//! # Invoice Repository
//!
//! Database operations for invoices and their line items.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices (1 row)                 invoice_items (N rows)               │
//! │  ┌──────────────────────────┐     ┌────────────────────────────────┐   │
//! │  │ id, invoice_number       │◄────│ invoice_id, position           │   │
//! │  │ customer_id, vin, ...    │     │ item_id?, name, qty, unit price │   │
//! │  │ discount_ppm, tax_ppm    │     └────────────────────────────────┘   │
//! │  │ *_cents snapshot         │         ON DELETE CASCADE                │
//! │  └──────────────────────────┘                                          │
//! │                                                                         │
//! │  insert() writes both in ONE transaction: readers never see an         │
//! │  invoice without its lines, and a rejected invoice_number leaves       │
//! │  nothing behind.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use wrench_core::{
    Invoice, LineItem, Money, PaymentMethod, PaymentStatus, Percent, TotalsSnapshot,
};

// =============================================================================
// Records
// =============================================================================

const INVOICE_COLUMNS: &str = r#"
    i.id, i.invoice_number, i.vin, i.year_model, i.customer_id,
    i.discount_ppm, i.tax_ppm, i.deposit_cents, i.refund_amount_cents,
    i.refund_reason, i.notes, i.payment_status, i.payment_method,
    i.subtotal_cents, i.discount_amount_cents, i.taxable_amount_cents,
    i.tax_amount_cents, i.grand_total_cents, i.created_at, i.updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRecord {
    id: String,
    invoice_number: String,
    vin: Option<String>,
    year_model: Option<String>,
    customer_id: String,
    discount_ppm: i64,
    tax_ppm: i64,
    deposit_cents: i64,
    refund_amount_cents: i64,
    refund_reason: Option<String>,
    notes: Option<String>,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    subtotal_cents: i64,
    discount_amount_cents: i64,
    taxable_amount_cents: i64,
    tax_amount_cents: i64,
    grand_total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRecord {
    fn into_invoice(self, items: Vec<LineItem>) -> Invoice {
        Invoice {
            id: self.id,
            invoice_number: self.invoice_number,
            vin: self.vin,
            year_model: self.year_model,
            customer_id: self.customer_id,
            items,
            discount: Percent::from_ppm(self.discount_ppm),
            tax: Percent::from_ppm(self.tax_ppm),
            deposit: Money::from_cents(self.deposit_cents),
            refund_amount: Money::from_cents(self.refund_amount_cents),
            refund_reason: self.refund_reason,
            notes: self.notes,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            totals: TotalsSnapshot {
                subtotal: Money::from_cents(self.subtotal_cents),
                discount_amount: Money::from_cents(self.discount_amount_cents),
                taxable_amount: Money::from_cents(self.taxable_amount_cents),
                tax_amount: Money::from_cents(self.tax_amount_cents),
                grand_total: Money::from_cents(self.grand_total_cents),
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRecord {
    invoice_id: String,
    item_id: Option<String>,
    name: String,
    quantity: i64,
    unit_price_cents: i64,
}

impl From<LineItemRecord> for LineItem {
    fn from(record: LineItemRecord) -> Self {
        LineItem {
            item_id: record.item_id,
            name: record.name,
            quantity: record.quantity,
            unit_price: Money::from_cents(record.unit_price_cents),
        }
    }
}

/// A line's link to the catalog item whose stock it moved.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockLink {
    pub position: i64,
    pub name: String,
    pub quantity: i64,
    /// Set when the line's stock change is applied, cleared when it is
    /// reversed. `None` for lines that never touched stock.
    pub stock_item_id: Option<String>,
}

// =============================================================================
// Filter
// =============================================================================

/// Invoice search criteria. All present criteria must match.
///
/// `text` matches the invoice number, the VIN, or the linked customer's
/// name. All text matching is a case-insensitive substring match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default, alias = "q")]
    pub text: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl InvoiceFilter {
    /// Filter on free text only.
    pub fn text(query: impl Into<String>) -> Self {
        InvoiceFilter {
            text: Some(query.into()),
            ..InvoiceFilter::default()
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = InvoiceRepository::new(pool);
///
/// repo.insert(&invoice).await?;
/// let found = repo.find(&InvoiceFilter::text("reyes"), 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Writes an invoice and its line items in one transaction.
    ///
    /// ## Errors
    /// `UniqueViolation` on `invoices.invoice_number` when the number is
    /// taken. Nothing is written in that case.
    pub async fn insert(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            lines = invoice.items.len(),
            "Inserting invoice"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, invoice_number, vin, year_model, customer_id,
                discount_ppm, tax_ppm, deposit_cents, refund_amount_cents,
                refund_reason, notes, payment_status, payment_method,
                subtotal_cents, discount_amount_cents, taxable_amount_cents,
                tax_amount_cents, grand_total_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.invoice_number)
        .bind(&invoice.vin)
        .bind(&invoice.year_model)
        .bind(&invoice.customer_id)
        .bind(invoice.discount.ppm())
        .bind(invoice.tax.ppm())
        .bind(invoice.deposit.cents())
        .bind(invoice.refund_amount.cents())
        .bind(&invoice.refund_reason)
        .bind(&invoice.notes)
        .bind(invoice.payment_status)
        .bind(invoice.payment_method)
        .bind(invoice.totals.subtotal.cents())
        .bind(invoice.totals.discount_amount.cents())
        .bind(invoice.totals.taxable_amount.cents())
        .bind(invoice.totals.tax_amount.cents())
        .bind(invoice.totals.grand_total.cents())
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).with_value(&invoice.invoice_number))?;

        for (position, line) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items
                    (invoice_id, position, item_id, name, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&invoice.id)
            .bind(position as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Gets an invoice, with its line items in order.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Invoice>> {
        let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.id = ?1");
        let record = sqlx::query_as::<_, InvoiceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match record {
            Some(record) => Ok(self.attach_items(vec![record]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Lists invoices, newest first.
    pub async fn list(&self, limit: i64) -> DbResult<Vec<Invoice>> {
        self.find(&InvoiceFilter::default(), limit).await
    }

    /// Finds invoices matching `filter`, newest first.
    ///
    /// Invoices created in the same instant are ordered by number, highest
    /// first. `filter.limit` is ignored here; callers pass the clamped
    /// `limit` explicitly.
    pub async fn find(&self, filter: &InvoiceFilter, limit: i64) -> DbResult<Vec<Invoice>> {
        debug!(?filter, limit, "Finding invoices");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        qb.push(INVOICE_COLUMNS);
        qb.push(" FROM invoices i JOIN customers c ON c.id = i.customer_id WHERE 1 = 1");

        if let Some(text) = non_blank(&filter.text) {
            let pattern = contains_pattern(text);
            qb.push(" AND (i.invoice_number LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR i.vin LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR c.name_folded LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(name) = non_blank(&filter.customer_name) {
            qb.push(" AND c.name_folded LIKE ")
                .push_bind(contains_pattern(name))
                .push(" ESCAPE '\\'");
        }

        if let Some(status) = filter.payment_status {
            qb.push(" AND i.payment_status = ").push_bind(status);
        }

        qb.push(" ORDER BY i.created_at DESC, i.invoice_number DESC LIMIT ")
            .push_bind(limit);

        let records = qb
            .build_query_as::<InvoiceRecord>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(records).await
    }

    /// Loads line items for `records` with one query and assembles invoices,
    /// keeping the order of `records`.
    async fn attach_items(&self, records: Vec<InvoiceRecord>) -> DbResult<Vec<Invoice>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT invoice_id, item_id, name, quantity, unit_price_cents \
             FROM invoice_items WHERE invoice_id IN (",
        );
        let mut ids = qb.separated(", ");
        for record in &records {
            ids.push_bind(record.id.clone());
        }
        qb.push(") ORDER BY invoice_id, position");

        let lines = qb
            .build_query_as::<LineItemRecord>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_invoice: HashMap<String, Vec<LineItem>> = HashMap::new();
        for line in lines {
            by_invoice
                .entry(line.invoice_id.clone())
                .or_default()
                .push(LineItem::from(line));
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let items = by_invoice.remove(&record.id).unwrap_or_default();
                record.into_invoice(items)
            })
            .collect())
    }

    /// The invoice's lines in order, with the item each one moved.
    pub async fn stock_links(&self, invoice_id: &str) -> DbResult<Vec<StockLink>> {
        let links = sqlx::query_as::<_, StockLink>(
            r#"
            SELECT position, name, quantity, stock_item_id
            FROM invoice_items
            WHERE invoice_id = ?1
            ORDER BY position
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(links)
    }

    /// Changes a line's stock link from `from` to `to` on `conn`.
    ///
    /// Returns `false` when the link no longer holds `from`, which means
    /// another caller already moved it.
    pub(crate) async fn swap_stock_link(
        conn: &mut SqliteConnection,
        invoice_id: &str,
        position: i64,
        from: Option<&str>,
        to: Option<&str>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invoice_items
            SET stock_item_id = ?1
            WHERE invoice_id = ?2 AND position = ?3 AND stock_item_id IS ?4
            "#,
        )
        .bind(to)
        .bind(invoice_id)
        .bind(position)
        .bind(from)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Deletes an invoice (line items cascade). Returns whether a row was
    /// removed.
    pub async fn delete_by_id(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of stored invoices.
    pub async fn count_all(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Persists the amendable fields of `invoice`: payment status, refund
    /// amount and reason, the totals snapshot, and `updated_at`.
    ///
    /// ## Errors
    /// `NotFound` when the invoice no longer exists.
    pub async fn update_payment(&self, invoice: &Invoice) -> DbResult<()> {
        debug!(
            id = %invoice.id,
            status = invoice.payment_status.as_str(),
            refund_cents = invoice.refund_amount.cents(),
            "Updating invoice payment"
        );

        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET payment_status = ?1,
                refund_amount_cents = ?2,
                refund_reason = ?3,
                subtotal_cents = ?4,
                discount_amount_cents = ?5,
                taxable_amount_cents = ?6,
                tax_amount_cents = ?7,
                grand_total_cents = ?8,
                updated_at = ?9
            WHERE id = ?10
            "#,
        )
        .bind(invoice.payment_status)
        .bind(invoice.refund_amount.cents())
        .bind(&invoice.refund_reason)
        .bind(invoice.totals.subtotal.cents())
        .bind(invoice.totals.discount_amount.cents())
        .bind(invoice.totals.taxable_amount.cents())
        .bind(invoice.totals.tax_amount.cents())
        .bind(invoice.totals.grand_total.cents())
        .bind(invoice.updated_at)
        .bind(&invoice.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", &invoice.id));
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::Duration;
    use wrench_core::{CustomerDetails, InvoiceTotals};

    async fn customer_id(db: &Database, name: &str) -> String {
        db.customers()
            .insert(&CustomerDetails {
                name: name.to_string(),
                phone: "555-0101".to_string(),
                address: None,
            })
            .await
            .unwrap()
            .id
    }

    fn invoice(number: &str, customer_id: &str, minutes_ago: i64) -> Invoice {
        let items = vec![
            LineItem::new("Brake Pads", 2, Money::from_cents(5000)),
            LineItem::new("Labour", 1, Money::from_cents(8000)),
        ];
        let mut invoice = Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            invoice_number: number.to_string(),
            vin: Some("1HGCM82633A004352".to_string()),
            year_model: Some("2012 Civic".to_string()),
            customer_id: customer_id.to_string(),
            items,
            discount: Percent::from_bps(1000),
            tax: Percent::from_bps(800),
            deposit: Money::from_cents(2000),
            refund_amount: Money::zero(),
            refund_reason: None,
            notes: None,
            payment_status: PaymentStatus::Paid,
            payment_method: PaymentMethod::Card,
            totals: TotalsSnapshot::default(),
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            updated_at: Utc::now() - Duration::minutes(minutes_ago),
        };
        invoice.totals = InvoiceTotals::calculate(&invoice.items, &invoice.adjustments())
            .unwrap()
            .snapshot();
        invoice
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = customer_id(&db, "Dana Reyes").await;
        let repo = db.invoices();

        let original = invoice("INV-26100001", &customer, 0);
        repo.insert(&original).await.unwrap();

        let loaded = repo.get_by_id(&original.id).await.unwrap().unwrap();
        assert_eq!(loaded.invoice_number, "INV-26100001");
        assert_eq!(loaded.items, original.items);
        assert_eq!(loaded.totals, original.totals);
        assert_eq!(loaded.payment_method, PaymentMethod::Card);
        assert_eq!(repo.count_all().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_number_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = customer_id(&db, "Dana Reyes").await;
        let repo = db.invoices();

        repo.insert(&invoice("INV-26100001", &customer, 0)).await.unwrap();
        let duplicate = invoice("INV-26100001", &customer, 0);
        let err = repo.insert(&duplicate).await.unwrap_err();

        assert!(err.is_unique_violation_on("invoices.invoice_number"));
        assert!(repo.get_by_id(&duplicate.id).await.unwrap().is_none());
        assert_eq!(repo.count_all().await.unwrap(), 1);

        let orphan_lines: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE invoice_id = ?1")
                .bind(&duplicate.id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphan_lines, 0);
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .invoices()
            .insert(&invoice("INV-26100001", "no-such-customer", 0))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation(_)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = customer_id(&db, "Dana Reyes").await;
        let repo = db.invoices();

        repo.insert(&invoice("INV-26100001", &customer, 30)).await.unwrap();
        repo.insert(&invoice("INV-26100002", &customer, 20)).await.unwrap();
        repo.insert(&invoice("INV-26100003", &customer, 10)).await.unwrap();

        let numbers: Vec<String> = repo
            .list(2)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.invoice_number)
            .collect();
        assert_eq!(numbers, vec!["INV-26100003", "INV-26100002"]);
    }

    #[tokio::test]
    async fn test_find_by_customer_name_case_insensitive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dana = customer_id(&db, "Dana Reyes").await;
        let sam = customer_id(&db, "Sam Ortiz").await;
        let repo = db.invoices();

        repo.insert(&invoice("INV-26100001", &dana, 2)).await.unwrap();
        repo.insert(&invoice("INV-26100002", &sam, 1)).await.unwrap();

        let found = repo.find(&InvoiceFilter::text("rEyEs"), 10).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].invoice_number, "INV-26100001");
        assert_eq!(found[0].items.len(), 2);

        let by_number = repo.find(&InvoiceFilter::text("0002"), 10).await.unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].customer_id, sam);

        let by_vin = repo.find(&InvoiceFilter::text("a0043"), 10).await.unwrap();
        assert_eq!(by_vin.len(), 2);

        let filter = InvoiceFilter {
            customer_name: Some("ortiz".to_string()),
            payment_status: Some(PaymentStatus::Unpaid),
            ..InvoiceFilter::default()
        };
        assert!(repo.find(&filter, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_cascades_line_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = customer_id(&db, "Dana Reyes").await;
        let repo = db.invoices();

        let stored = invoice("INV-26100001", &customer, 0);
        repo.insert(&stored).await.unwrap();

        assert!(repo.delete_by_id(&stored.id).await.unwrap());
        assert!(!repo.delete_by_id(&stored.id).await.unwrap());

        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);
    }

    #[tokio::test]
    async fn test_update_payment() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = customer_id(&db, "Dana Reyes").await;
        let repo = db.invoices();

        let mut stored = invoice("INV-26100001", &customer, 0);
        repo.insert(&stored).await.unwrap();

        stored.payment_status = PaymentStatus::Unpaid;
        stored.refund_amount = Money::from_cents(1000);
        stored.refund_reason = Some("Wrong part".to_string());
        stored.totals = stored.recompute_totals().unwrap().snapshot();
        repo.update_payment(&stored).await.unwrap();

        let loaded = repo.get_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(loaded.payment_status, PaymentStatus::Unpaid);
        assert_eq!(loaded.refund_reason.as_deref(), Some("Wrong part"));
        assert_eq!(loaded.totals.grand_total, stored.totals.grand_total);

        stored.id = "missing".to_string();
        let err = repo.update_payment(&stored).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
