//! # Invoice Documents
//!
//! Builds one display model of an invoice and renders it as HTML or PDF.
//!
//! ## Rendering Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice + Customer + ShopProfile                                       │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  InvoiceDocument::build  ◄── InvoiceTotals::calculate (same as create) │
//! │            │                                                            │
//! │     ┌──────┴──────┐                                                     │
//! │     ▼             ▼                                                     │
//! │  html::render  pdf::render                                              │
//! │  (askama)      (PDF 1.4 writer)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every string either renderer prints comes from `InvoiceDocument`, so the
//! two outputs cannot show different figures.

pub mod html;
pub mod pdf;

use serde::Serialize;

use crate::error::CoreResult;
use crate::totals::TotalsSnapshot;
use crate::types::{Customer, Invoice, ShopProfile};

pub use html::render_html;
pub use pdf::render_pdf;

/// Date format printed on documents.
const DOCUMENT_DATE_FORMAT: &str = "%B %d, %Y";

/// A label/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRow {
    pub label: String,
    pub value: String,
}

impl DocumentRow {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One row of the itemized table, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentLine {
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub line_total: String,
}

/// The display model shared by both renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDocument {
    pub shop_name: String,
    /// Address lines, phone, email.
    pub shop_lines: Vec<String>,
    /// Invoice number, date, vehicle.
    pub invoice_rows: Vec<DocumentRow>,
    /// Name, phone, address.
    pub customer_lines: Vec<String>,
    pub lines: Vec<DocumentLine>,
    /// Method, Status, Subtotal, [Discount], Tax, [Deposit], Grand Total.
    pub totals_rows: Vec<DocumentRow>,
    /// Empty when the invoice has no notes.
    pub notes: Vec<String>,
    /// Empty when there is nothing refunded.
    pub refund_rows: Vec<DocumentRow>,
    #[serde(skip)]
    pub totals: TotalsSnapshot,
}

impl InvoiceDocument {
    /// Builds the document, recomputing totals from the invoice inputs.
    ///
    /// ## Errors
    /// Whatever the Total Calculator reports for the stored inputs.
    pub fn build(invoice: &Invoice, customer: &Customer, shop: &ShopProfile) -> CoreResult<Self> {
        let totals = invoice.recompute_totals()?.snapshot();

        let mut shop_lines = shop.address_lines.clone();
        shop_lines.push(format!("Phone: {}", shop.phone));
        if let Some(email) = &shop.email {
            shop_lines.push(format!("Email: {}", email));
        }

        let mut invoice_rows = vec![
            DocumentRow::new("Invoice #", invoice.invoice_number.as_str()),
            DocumentRow::new(
                "Date",
                invoice.created_at.format(DOCUMENT_DATE_FORMAT).to_string(),
            ),
        ];
        if let Some(vin) = &invoice.vin {
            invoice_rows.push(DocumentRow::new("VIN", vin.as_str()));
        }
        if let Some(year_model) = &invoice.year_model {
            invoice_rows.push(DocumentRow::new("Year Model", year_model.as_str()));
        }

        let mut customer_lines = vec![customer.name.clone(), customer.phone.clone()];
        customer_lines.extend(customer.address.iter().cloned());

        let lines = invoice
            .items
            .iter()
            .map(|item| {
                Ok(DocumentLine {
                    description: item.name.clone(),
                    quantity: item.quantity.to_string(),
                    unit_price: item.unit_price.to_string(),
                    line_total: item.line_total()?.to_string(),
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        let mut totals_rows = vec![
            DocumentRow::new("Method", invoice.payment_method.as_str()),
            DocumentRow::new("Status", invoice.payment_status.as_str()),
            DocumentRow::new("Subtotal", totals.subtotal.to_string()),
        ];
        if invoice.discount.is_positive() {
            totals_rows.push(DocumentRow::new(
                format!("Discount ({}%)", invoice.discount),
                (-totals.discount_amount).to_string(),
            ));
        }
        totals_rows.push(DocumentRow::new(
            format!("Tax ({}%)", invoice.tax),
            totals.tax_amount.to_string(),
        ));
        if invoice.deposit.is_positive() {
            totals_rows.push(DocumentRow::new(
                "Deposit",
                (-invoice.deposit).to_string(),
            ));
        }
        totals_rows.push(DocumentRow::new("Grand Total", totals.grand_total.to_string()));

        let notes = invoice
            .notes
            .as_deref()
            .map(|n| n.lines().map(str::to_string).collect())
            .unwrap_or_default();

        let mut refund_rows = Vec::new();
        if invoice.refund_amount.is_positive() || invoice.refund_reason.is_some() {
            refund_rows.push(DocumentRow::new(
                "Refund Amount",
                invoice.refund_amount.to_string(),
            ));
            if let Some(reason) = &invoice.refund_reason {
                refund_rows.push(DocumentRow::new("Reason", reason.as_str()));
            }
        }

        Ok(Self {
            shop_name: shop.name.clone(),
            shop_lines,
            invoice_rows,
            customer_lines,
            lines,
            totals_rows,
            notes,
            refund_rows,
            totals,
        })
    }

    /// Every monetary string this document displays, in reading order.
    pub fn figures(&self) -> Vec<&str> {
        let mut figures = Vec::new();
        for line in &self.lines {
            figures.push(line.unit_price.as_str());
            figures.push(line.line_total.as_str());
        }
        for row in self.totals_rows.iter().chain(&self.refund_rows) {
            if row.value.contains('$') {
                figures.push(row.value.as_str());
            }
        }
        figures
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
