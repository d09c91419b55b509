//! # Invoice Numbering
//!
//! Format rules for invoice numbers. Sequence values come from a per-period
//! counter in the database (see `wrench-db`); this module only knows how to
//! turn a period and a sequence into a number and back.
//!
//! ## Format
//! ```text
//! INV-2610 0042
//! │   │ │  │
//! │   │ │  └── sequence within the period, 4 digits, zero padded
//! │   │ └───── month, 2 digits
//! │   └─────── year, last 2 digits
//! └─────────── fixed prefix
//! ```
//!
//! The period (`YYMM`) is part of the number, so a new month restarting at
//! `0001` never collides with an earlier month.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::INVOICE_NUMBER_PREFIX;

/// Highest sequence the four digit field can hold.
pub const MAX_SEQUENCE: i64 = 9_999;

// =============================================================================
// Number Period
// =============================================================================

/// A `YYMM` counter bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberPeriod {
    year: u32,
    month: u32,
}

impl NumberPeriod {
    /// The period a date falls into.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use wrench_core::numbering::NumberPeriod;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
    /// assert_eq!(NumberPeriod::from_date(&date).key(), "2603");
    /// ```
    pub fn from_date<D: Datelike>(date: &D) -> Self {
        Self {
            year: date.year().rem_euclid(100) as u32,
            month: date.month(),
        }
    }

    /// The `YYMM` key used for the counter row and in the number.
    pub fn key(&self) -> String {
        format!("{:02}{:02}", self.year, self.month)
    }
}

impl fmt::Display for NumberPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.year, self.month)
    }
}

// =============================================================================
// Invoice Number
// =============================================================================

/// A validated `INV-YYMM####` invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(try_from = "String", into = "String")]
#[ts(export)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    /// Builds the number for a period and sequence value.
    ///
    /// ## Errors
    /// - `SequenceExhausted` when `sequence` exceeds 9999
    /// - `InvalidRange` when `sequence` is below 1
    ///
    /// ## Example
    /// ```rust
    /// use chrono::NaiveDate;
    /// use wrench_core::numbering::{InvoiceNumber, NumberPeriod};
    ///
    /// let period = NumberPeriod::from_date(&NaiveDate::from_ymd_opt(2026, 10, 17).unwrap());
    /// let number = InvoiceNumber::format(period, 42).unwrap();
    /// assert_eq!(number.as_str(), "INV-26100042");
    /// ```
    pub fn format(period: NumberPeriod, sequence: i64) -> CoreResult<Self> {
        if sequence > MAX_SEQUENCE {
            return Err(CoreError::SequenceExhausted {
                period: period.key(),
                value: sequence,
            });
        }
        if sequence < 1 {
            return Err(CoreError::out_of_range(
                "invoice sequence",
                "must be at least 1",
            ));
        }

        Ok(InvoiceNumber(format!(
            "{}{}{:04}",
            INVOICE_NUMBER_PREFIX,
            period.key(),
            sequence
        )))
    }

    /// Parses and validates an invoice number.
    ///
    /// ## Errors
    /// `InvalidInvoiceNumber` when the prefix, length, digits, or month are
    /// wrong.
    pub fn parse(value: &str) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidInvoiceNumber {
            value: value.to_string(),
            reason: reason.to_string(),
        };

        let digits = value
            .strip_prefix(INVOICE_NUMBER_PREFIX)
            .ok_or_else(|| invalid("must start with INV-"))?;

        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected 8 digits after the prefix"));
        }

        let month: u32 = digits[2..4]
            .parse()
            .map_err(|_| invalid("month is not a number"))?;
        if !(1..=12).contains(&month) {
            return Err(invalid("month must be 01-12"));
        }

        if &digits[4..] == "0000" {
            return Err(invalid("sequence must be at least 0001"));
        }

        Ok(InvoiceNumber(value.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `YYMM` period key.
    pub fn period_key(&self) -> &str {
        &self.0[INVOICE_NUMBER_PREFIX.len()..INVOICE_NUMBER_PREFIX.len() + 4]
    }

    /// The sequence within the period.
    pub fn sequence(&self) -> i64 {
        self.0[INVOICE_NUMBER_PREFIX.len() + 4..]
            .parse()
            .unwrap_or_default()
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        InvoiceNumber::parse(&value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(number: InvoiceNumber) -> Self {
        number.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
