//! # Total Calculator
//!
//! Turns line items plus invoice adjustments into the five derived monetary
//! fields of an invoice. The same function runs when an invoice is created
//! and when it is rendered, so the two can never disagree.
//!
//! ## Calculation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line items ──► subtotal = Σ quantity × unit_price                      │
//! │                    │                                                    │
//! │                    ├──► discount_amount = subtotal × discount%          │
//! │                    ▼                                                    │
//! │                taxable_amount = subtotal − discount_amount              │
//! │                    │                                                    │
//! │                    ├──► tax_amount = taxable_amount × tax%              │
//! │                    ▼                                                    │
//! │                grand_total = taxable + tax − deposit − refund           │
//! │                                                                         │
//! │  Every stage is exact (ExactMoney). Rounding to cents happens once,    │
//! │  per field, when the snapshot is taken.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Empty invoices are legal: the subtotal is zero and the grand total is
//! `-(deposit + refund)`. Negative grand totals are reported as-is.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{ExactMoney, Money, Percent};
use crate::types::LineItem;
use crate::validation::{validate_line_item_count, validate_quantity};

// =============================================================================
// Adjustments
// =============================================================================

/// Invoice-level parameters applied on top of the line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Adjustments {
    /// Discount percentage, 0–100.
    pub discount: Percent,
    /// Tax percentage, ≥ 0.
    pub tax: Percent,
    /// Deposit already received, ≥ 0.
    pub deposit: Money,
    /// Amount refunded, ≥ 0.
    pub refund_amount: Money,
}

impl Adjustments {
    /// Checks every field against its legal range.
    ///
    /// ## Errors
    /// `InvalidRange` naming the first offending field.
    pub fn validate(&self) -> CoreResult<()> {
        if self.discount < Percent::zero() || self.discount > Percent::HUNDRED {
            return Err(CoreError::out_of_range(
                "discount",
                "must be between 0 and 100 percent",
            ));
        }
        if self.tax < Percent::zero() {
            return Err(CoreError::out_of_range("tax", "must not be negative"));
        }
        if self.deposit.is_negative() {
            return Err(CoreError::out_of_range("deposit", "must not be negative"));
        }
        if self.refund_amount.is_negative() {
            return Err(CoreError::out_of_range(
                "refund amount",
                "must not be negative",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Totals Snapshot
// =============================================================================

/// The derived fields rounded to cents.
///
/// This is what gets persisted next to the invoice and what documents print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TotalsSnapshot {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub taxable_amount: Money,
    pub tax_amount: Money,
    pub grand_total: Money,
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// Result of one run of the Total Calculator.
///
/// Holds both the exact stage values and their rounded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceTotals {
    exact_subtotal: ExactMoney,
    exact_discount: ExactMoney,
    exact_taxable: ExactMoney,
    exact_tax: ExactMoney,
    exact_grand_total: ExactMoney,
    snapshot: TotalsSnapshot,
}

impl InvoiceTotals {
    /// Runs the calculator.
    ///
    /// ## Errors
    /// - `InvalidLineItem` for a blank description, quantity < 1, a negative
    ///   unit price, or a line total too large for cents
    /// - `InvalidRange` for adjustments outside their ranges, too many line
    ///   items, or a stage amount too large to carry
    ///
    /// ## Example
    /// ```rust
    /// use wrench_core::money::{Money, Percent};
    /// use wrench_core::totals::{Adjustments, InvoiceTotals};
    ///
    /// let adjustments = Adjustments {
    ///     refund_amount: Money::from_cents(1500),
    ///     ..Adjustments::default()
    /// };
    /// let totals = InvoiceTotals::calculate(&[], &adjustments).unwrap();
    /// assert_eq!(totals.grand_total().cents(), -1500);
    /// ```
    pub fn calculate(items: &[LineItem], adjustments: &Adjustments) -> CoreResult<Self> {
        validate_line_item_count(items.len())
            .map_err(|e| CoreError::out_of_range("items", e.to_string()))?;
        adjustments.validate()?;

        let mut subtotal = ExactMoney::zero();
        for (index, item) in items.iter().enumerate() {
            validate_line(index, item)?;
            let line_total = item
                .line_total()
                .map_err(|_| CoreError::line_item(index, "line total is too large"))?;
            subtotal = subtotal.checked_add(line_total.exact(), "subtotal")?;
        }

        let discount = subtotal.percent_of(adjustments.discount, "discount amount")?;
        let taxable = subtotal.checked_sub(discount, "taxable amount")?;
        let tax = taxable.percent_of(adjustments.tax, "tax amount")?;
        let grand_total = taxable
            .checked_add(tax, "grand total")?
            .checked_sub(adjustments.deposit.exact(), "grand total")?
            .checked_sub(adjustments.refund_amount.exact(), "grand total")?;

        let snapshot = TotalsSnapshot {
            subtotal: subtotal.round_to_cents("subtotal")?,
            discount_amount: discount.round_to_cents("discount amount")?,
            taxable_amount: taxable.round_to_cents("taxable amount")?,
            tax_amount: tax.round_to_cents("tax amount")?,
            grand_total: grand_total.round_to_cents("grand total")?,
        };

        Ok(Self {
            exact_subtotal: subtotal,
            exact_discount: discount,
            exact_taxable: taxable,
            exact_tax: tax,
            exact_grand_total: grand_total,
            snapshot,
        })
    }

    /// The rounded figures.
    #[inline]
    pub fn snapshot(&self) -> TotalsSnapshot {
        self.snapshot
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        self.snapshot.subtotal
    }

    #[inline]
    pub fn discount_amount(&self) -> Money {
        self.snapshot.discount_amount
    }

    #[inline]
    pub fn taxable_amount(&self) -> Money {
        self.snapshot.taxable_amount
    }

    #[inline]
    pub fn tax_amount(&self) -> Money {
        self.snapshot.tax_amount
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        self.snapshot.grand_total
    }

    /// Exact stage values, in calculation order:
    /// subtotal, discount, taxable, tax, grand total.
    pub fn exact(&self) -> [ExactMoney; 5] {
        [
            self.exact_subtotal,
            self.exact_discount,
            self.exact_taxable,
            self.exact_tax,
            self.exact_grand_total,
        ]
    }
}

fn validate_line(index: usize, item: &LineItem) -> CoreResult<()> {
    if item.name.trim().is_empty() {
        return Err(CoreError::line_item(index, "description is required"));
    }
    validate_quantity(item.quantity).map_err(|e| CoreError::line_item(index, e.to_string()))?;
    if item.unit_price.is_negative() {
        return Err(CoreError::line_item(index, "unit price must not be negative"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
