//! # Domain Types
//!
//! Core domain types used throughout Wrench POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Invoice     │   │      Item       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  customer_id    │   │  id (UUID)      │       │
//! │  │  name + phone   │   │  invoice_number │   │  name (unique)  │       │
//! │  │  address        │   │  items ─────────┼──►│  price          │       │
//! │  └─────────────────┘   │  totals         │   │  quantity       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  ShopSettings   │   │ PaymentStatus   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  default tax    │   │  Paid           │   │  Cash           │       │
//! │  │  default disc.  │   │  Unpaid         │   │  Card           │       │
//! │  └─────────────────┘   └─────────────────┘   │  Cheque         │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invoice Lifecycle
//! ```text
//! NewInvoice ──into_draft()──► InvoiceDraft ──persist──► Invoice ──delete──► (gone)
//!  (request)     (defaults,      (validated,     (numbered,      (stock restored)
//!                 trimming)       totals known)   stock applied)
//! ```
//! Only the payment status and the refund fields of a persisted invoice may
//! change afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Percent};
use crate::totals::{Adjustments, InvoiceTotals, TotalsSnapshot};
use crate::validation::{
    validate_name, validate_optional_text, validate_phone, validate_price_cents, MAX_NOTES_LEN,
    MAX_VEHICLE_FIELD_LEN,
};

// =============================================================================
// Payment Status
// =============================================================================

/// Whether the customer has settled the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    Paid,
    Unpaid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Unpaid => "Unpaid",
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Cheque => "Cheque",
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A shop customer. `(name, phone)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Customer fields as submitted with an invoice or on explicit creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerDetails {
    /// Returns a trimmed, validated copy.
    pub fn normalized(&self) -> CoreResult<CustomerDetails> {
        Ok(CustomerDetails {
            name: validate_name("customer name", &self.name)?,
            phone: validate_phone(&self.phone)?,
            address: validate_optional_text(
                "customer address",
                self.address.as_deref(),
                MAX_NOTES_LEN,
            )?,
        })
    }
}

// =============================================================================
// Catalog Item
// =============================================================================

/// A stocked part or service.
///
/// `quantity` is on-hand stock. It may go negative: an invoice is never
/// rejected for insufficient stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub quantity: i64,
}

impl NewItem {
    pub fn normalized(&self) -> CoreResult<NewItem> {
        validate_price_cents(self.price.cents())?;
        Ok(NewItem {
            name: validate_name("item name", &self.name)?,
            price: self.price,
            quantity: self.quantity,
        })
    }
}

/// Partial update of a catalog item. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Money>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl ItemUpdate {
    pub fn normalized(&self) -> CoreResult<ItemUpdate> {
        if let Some(price) = self.price {
            validate_price_cents(price.cents())?;
        }
        let name = match &self.name {
            Some(name) => Some(validate_name("item name", name)?),
            None => None,
        };
        Ok(ItemUpdate {
            name,
            price: self.price,
            quantity: self.quantity,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.quantity.is_none()
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One priced row on an invoice.
///
/// `unit_price` is frozen at invoice time. Any client-supplied line total is
/// ignored; [`LineItem::line_total`] is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Catalog item this line was sold from, if any.
    #[serde(default)]
    pub item_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        Self {
            item_id: None,
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// Links this line to a catalog item.
    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    /// quantity × unit price.
    ///
    /// ## Errors
    /// `InvalidRange` when the product does not fit in cents.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| CoreError::out_of_range("line total", "amount is too large"))
    }
}

// =============================================================================
// Shop Settings
// =============================================================================

/// Shop-wide invoice defaults. One row, created on first start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShopSettings {
    pub tax: Percent,
    pub discount: Percent,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
}

/// Settings change as submitted. Percentages are decimal (`8.25`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub tax: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
}

impl SettingsUpdate {
    /// Applies this update to `current`, validating the new defaults with
    /// the same ranges an invoice uses.
    pub fn apply(&self, current: &ShopSettings) -> CoreResult<ShopSettings> {
        let tax = match self.tax {
            Some(pct) => Percent::from_percentage("tax", pct)?,
            None => current.tax,
        };
        let discount = match self.discount {
            Some(pct) => Percent::from_percentage("discount", pct)?,
            None => current.discount,
        };

        Adjustments {
            discount,
            tax,
            ..Adjustments::default()
        }
        .validate()?;

        Ok(ShopSettings {
            tax,
            discount,
            payment_method: self.payment_method.unwrap_or(current.payment_method),
            payment_status: self.payment_status.unwrap_or(current.payment_status),
        })
    }
}

/// The company header printed on invoice documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShopProfile {
    pub name: String,
    pub address_lines: Vec<String>,
    pub phone: String,
    pub email: Option<String>,
}

impl Default for ShopProfile {
    fn default() -> Self {
        Self {
            name: "Wrench Auto Repair".to_string(),
            address_lines: vec!["123 Main Street".to_string(), "Springfield".to_string()],
            phone: "(555) 010-0000".to_string(),
            email: None,
        }
    }
}

// =============================================================================
// New Invoice (request)
// =============================================================================

/// An invoice as submitted for creation.
///
/// Omitted discount, tax, payment method and payment status are taken from
/// [`ShopSettings`]. Percentages are decimal (`8.25`); amounts are cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInvoice {
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default)]
    pub year_model: Option<String>,
    pub customer: CustomerDetails,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub tax: Option<f64>,
    #[serde(default)]
    pub deposit: Option<Money>,
    #[serde(default)]
    pub refund_amount: Option<Money>,
    #[serde(default)]
    pub refund_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
}

impl NewInvoice {
    /// Resolves defaults from `settings`, trims text fields, and runs the
    /// Total Calculator once to validate items and ranges.
    ///
    /// ## Errors
    /// Any `CoreError` from validation or the calculator. Nothing has been
    /// written anywhere when this fails.
    pub fn into_draft(self, settings: &ShopSettings) -> CoreResult<InvoiceDraft> {
        let discount = match self.discount {
            Some(pct) => Percent::from_percentage("discount", pct)?,
            None => settings.discount,
        };
        let tax = match self.tax {
            Some(pct) => Percent::from_percentage("tax", pct)?,
            None => settings.tax,
        };

        let adjustments = Adjustments {
            discount,
            tax,
            deposit: self.deposit.unwrap_or_default(),
            refund_amount: self.refund_amount.unwrap_or_default(),
        };

        let items: Vec<LineItem> = self
            .items
            .into_iter()
            .map(|mut line| {
                line.name = line.name.trim().to_string();
                line.item_id = line.item_id.filter(|id| !id.trim().is_empty());
                line
            })
            .collect();

        let totals = InvoiceTotals::calculate(&items, &adjustments)?;

        Ok(InvoiceDraft {
            vin: validate_optional_text("vin", self.vin.as_deref(), MAX_VEHICLE_FIELD_LEN)?,
            year_model: validate_optional_text(
                "year model",
                self.year_model.as_deref(),
                MAX_VEHICLE_FIELD_LEN,
            )?,
            customer: self.customer.normalized()?,
            items,
            adjustments,
            refund_reason: validate_optional_text(
                "refund reason",
                self.refund_reason.as_deref(),
                MAX_NOTES_LEN,
            )?,
            notes: validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?,
            payment_status: self.payment_status.unwrap_or(settings.payment_status),
            payment_method: self.payment_method.unwrap_or(settings.payment_method),
            totals: totals.snapshot(),
        })
    }
}

/// A validated invoice that has not been numbered or stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub vin: Option<String>,
    pub year_model: Option<String>,
    pub customer: CustomerDetails,
    pub items: Vec<LineItem>,
    pub adjustments: Adjustments,
    pub refund_reason: Option<String>,
    pub notes: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub totals: TotalsSnapshot,
}

// =============================================================================
// Invoice
// =============================================================================

/// A persisted invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub vin: Option<String>,
    pub year_model: Option<String>,
    pub customer_id: String,
    /// In invoice order.
    pub items: Vec<LineItem>,
    pub discount: Percent,
    pub tax: Percent,
    pub deposit: Money,
    pub refund_amount: Money,
    pub refund_reason: Option<String>,
    pub notes: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    /// Stored snapshot of the derived fields.
    pub totals: TotalsSnapshot,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn adjustments(&self) -> Adjustments {
        Adjustments {
            discount: self.discount,
            tax: self.tax,
            deposit: self.deposit,
            refund_amount: self.refund_amount,
        }
    }

    /// Runs the Total Calculator over the stored inputs.
    pub fn recompute_totals(&self) -> CoreResult<InvoiceTotals> {
        InvoiceTotals::calculate(&self.items, &self.adjustments())
    }
}

/// Result of a successful creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreatedInvoice {
    pub id: String,
    pub invoice_number: String,
    pub totals: TotalsSnapshot,
}

/// Payment and refund amendment. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentAmendment {
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub refund_amount: Option<Money>,
    #[serde(default)]
    pub refund_reason: Option<String>,
}

impl PaymentAmendment {
    /// Applies the amendment to a copy of `invoice` and recomputes totals.
    pub fn apply(&self, invoice: &Invoice) -> CoreResult<Invoice> {
        let mut amended = invoice.clone();

        if let Some(status) = self.payment_status {
            amended.payment_status = status;
        }
        if let Some(refund) = self.refund_amount {
            amended.refund_amount = refund;
        }
        if self.refund_reason.is_some() {
            amended.refund_reason = validate_optional_text(
                "refund reason",
                self.refund_reason.as_deref(),
                MAX_NOTES_LEN,
            )?;
        }

        amended.totals = amended.recompute_totals()?.snapshot();
        Ok(amended)
    }
}

/// An invoice together with its customer and the catalog items its lines
/// still reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolvedInvoice {
    pub invoice: Invoice,
    pub customer: Customer,
    pub catalog: Vec<Item>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NewInvoice {
        NewInvoice {
            vin: Some("  1HGCM82633A004352 ".to_string()),
            year_model: Some("   ".to_string()),
            customer: CustomerDetails {
                name: " Dana Reyes ".to_string(),
                phone: "555-0101".to_string(),
                address: None,
            },
            items: vec![LineItem::new("Brake pads", 2, Money::from_cents(5000))],
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

    #[test]
    fn test_enum_defaults() {
        assert_eq!(PaymentStatus::default(), PaymentStatus::Paid);
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cash);
    }

    #[test]
    fn test_enum_json_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Cheque).unwrap(), "\"Cheque\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::Unpaid).unwrap(), "\"Unpaid\"");
    }

    #[test]
    fn test_line_total() {
        let line = LineItem::new("Spark plug", 4, Money::from_cents(899));
        assert_eq!(line.line_total().unwrap().cents(), 3596);
    }

    #[test]
    fn test_client_line_total_is_ignored() {
        let json = r#"{"name":"Labour","quantity":2,"unit_price":5000,"total":1}"#;
        let line: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(line.line_total().unwrap().cents(), 10000);
    }

    #[test]
    fn test_draft_uses_settings_defaults() {
        let settings = ShopSettings {
            tax: Percent::from_bps(800),
            discount: Percent::from_bps(1000),
            payment_method: PaymentMethod::Card,
            payment_status: PaymentStatus::Unpaid,
        };

        let draft = request().into_draft(&settings).unwrap();
        assert_eq!(draft.adjustments.tax, Percent::from_bps(800));
        assert_eq!(draft.adjustments.discount, Percent::from_bps(1000));
        assert_eq!(draft.payment_method, PaymentMethod::Card);
        assert_eq!(draft.payment_status, PaymentStatus::Unpaid);
        assert_eq!(draft.totals.grand_total.cents(), 9720);
    }

    #[test]
    fn test_draft_explicit_values_override_settings() {
        let settings = ShopSettings {
            tax: Percent::from_bps(800),
            ..ShopSettings::default()
        };
        let mut req = request();
        req.tax = Some(0.0);
        req.payment_method = Some(PaymentMethod::Cheque);

        let draft = req.into_draft(&settings).unwrap();
        assert!(draft.adjustments.tax.is_zero());
        assert_eq!(draft.payment_method, PaymentMethod::Cheque);
    }

    #[test]
    fn test_draft_trims_vehicle_and_customer() {
        let draft = request().into_draft(&ShopSettings::default()).unwrap();
        assert_eq!(draft.vin.as_deref(), Some("1HGCM82633A004352"));
        assert_eq!(draft.year_model, None);
        assert_eq!(draft.customer.name, "Dana Reyes");
    }

    #[test]
    fn test_draft_rejects_bad_line() {
        let mut req = request();
        req.items.push(LineItem::new("Oops", 0, Money::from_cents(100)));
        let err = req.into_draft(&ShopSettings::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLineItem { index: 1, .. }));
    }

    #[test]
    fn test_draft_accepts_fractional_tax_and_bulk_quantity() {
        let mut req = request();
        req.tax = Some(8.875);
        req.items.push(LineItem::new("Washer", 10_000, Money::from_cents(1)));

        let draft = req.into_draft(&ShopSettings::default()).unwrap();
        assert_eq!(draft.adjustments.tax.ppm(), 88_750);
        assert_eq!(draft.items[1].quantity, 10_000);
    }

    #[test]
    fn test_draft_rejects_overflowing_line() {
        let mut req = request();
        req.items = vec![LineItem::new("Engine", 2, Money::from_cents(i64::MAX / 2 + 1))];
        let err = req.into_draft(&ShopSettings::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLineItem { index: 0, .. }));
    }

    #[test]
    fn test_new_item_rejects_negative_price() {
        let item = NewItem {
            name: "Rotor".to_string(),
            price: Money::from_cents(-1),
            quantity: 1,
        };
        assert!(matches!(item.normalized(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_draft_rejects_discount_over_hundred() {
        let mut req = request();
        req.discount = Some(100.5);
        assert!(matches!(
            req.into_draft(&ShopSettings::default()),
            Err(CoreError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_settings_update() {
        let current = ShopSettings::default();
        let update = SettingsUpdate {
            tax: Some(8.25),
            payment_status: Some(PaymentStatus::Unpaid),
            ..SettingsUpdate::default()
        };
        let next = update.apply(&current).unwrap();
        assert_eq!(next.tax, Percent::from_bps(825));
        assert!(next.discount.is_zero());
        assert_eq!(next.payment_status, PaymentStatus::Unpaid);
        assert_eq!(next.payment_method, PaymentMethod::Cash);

        let bad = SettingsUpdate {
            discount: Some(120.0),
            ..SettingsUpdate::default()
        };
        assert!(bad.apply(&current).is_err());
    }

    #[test]
    fn test_item_update_normalized() {
        let update = ItemUpdate {
            name: Some("  Air filter ".to_string()),
            ..ItemUpdate::default()
        };
        assert_eq!(update.normalized().unwrap().name.as_deref(), Some("Air filter"));

        let bad = ItemUpdate {
            price: Some(Money::from_cents(-1)),
            ..ItemUpdate::default()
        };
        assert!(bad.normalized().is_err());
        assert!(ItemUpdate::default().is_empty());
    }
}
