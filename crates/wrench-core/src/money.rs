//! # Money Module
//!
//! Provides the `Money` and `Percent` types for monetary values, plus the
//! exact carry type the Total Calculator works in.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  An invoice rendered twice must print the same grand total twice.       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Parts Per Million                        │
//! │    Money   = i64 cents            ($12.34 = 1234)                       │
//! │    Percent = i64 ppm of the whole (8.875% = 88750)                      │
//! │    Exact   = i128 of 10⁻¹² cent   (no rounding until display)           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use wrench_core::money::{Money, Percent};
//!
//! let price = Money::from_cents(123456);
//! assert_eq!(price.to_string(), "$1,234.56");
//!
//! let tax = Percent::from_ppm(88_750);
//! assert_eq!(tax.to_string(), "8.875");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Neg;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: grand totals may be negative (deposit or refund larger
///   than the work done)
/// - **Single field tuple struct**: serializes as a bare integer of cents
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Item.price ──► LineItem.unit_price ──► LineItem.line_total            │
/// │                                              │                          │
/// │                                              ▼                          │
/// │  Invoice.deposit ─────► InvoiceTotals (exact) ──► TotalsSnapshot       │
/// │  Invoice.refund_amount ─┘                          (rounded cents)      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use wrench_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from dollars and cents.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is -$5.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the dollars portion (truncated toward zero).
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion, always 0-99.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity, `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use wrench_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(4599); // $45.99
    /// assert_eq!(unit_price.checked_mul_quantity(3).unwrap().cents(), 13797);
    /// assert!(Money::from_cents(i64::MAX).checked_mul_quantity(2).is_none());
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Lifts this amount into the exact carry type.
    #[inline]
    pub const fn exact(&self) -> ExactMoney {
        ExactMoney::from_money(*self)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays as `$1,234.56`, negatives as `-$15.00`.
///
/// This exact string is printed on both invoice documents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let dollars = self.dollars().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}.{:02}", sign, grouped, self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Percent
// =============================================================================

/// Units of [`Percent`] per whole percent.
pub const PPM_PER_PERCENT: i64 = 10_000;

/// A percentage in parts per million of the whole.
///
/// `1_000_000` is 100% and `88_750` is 8.875%, so four fractional digits of
/// a percentage are carried exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(i64);

impl Percent {
    /// 100%.
    pub const HUNDRED: Percent = Percent(1_000_000);

    #[inline]
    pub const fn from_ppm(ppm: i64) -> Self {
        Percent(ppm)
    }

    /// Basis points (hundredths of a percent): `825` is 8.25%.
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percent(bps * 100)
    }

    /// Converts a decimal percentage (`8.875`) into parts per million.
    ///
    /// Digits beyond the fourth decimal place are rounded half away from
    /// zero.
    ///
    /// ## Errors
    /// `InvalidRange` when the value is not finite or too large to carry.
    ///
    /// ## Example
    /// ```rust
    /// use wrench_core::money::Percent;
    ///
    /// assert_eq!(Percent::from_percentage("tax", 8.875).unwrap().ppm(), 88_750);
    /// assert_eq!(Percent::from_percentage("tax", 8.25).unwrap().ppm(), 82_500);
    /// ```
    pub fn from_percentage(field: &str, pct: f64) -> CoreResult<Self> {
        if !pct.is_finite() {
            return Err(CoreError::out_of_range(field, "must be a finite number"));
        }

        let ppm = (pct * PPM_PER_PERCENT as f64).round();
        if ppm.abs() > MAX_PERCENT_PPM as f64 {
            return Err(CoreError::out_of_range(field, "value is too large"));
        }

        Ok(Percent(ppm as i64))
    }

    #[inline]
    pub const fn ppm(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal percentage (for JSON output only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / PPM_PER_PERCENT as f64
    }

    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

/// Displays the percentage without trailing zeros: `10`, `8.5`, `8.875`.
impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / PPM_PER_PERCENT as u64;
        let frac = abs % PPM_PER_PERCENT as u64;

        if frac == 0 {
            return write!(f, "{}{}", sign, whole);
        }
        let digits = format!("{:04}", frac);
        write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
    }
}

// =============================================================================
// Exact Money
// =============================================================================

/// Largest percentage accepted from input, 10⁶ % in ppm.
const MAX_PERCENT_PPM: i64 = 1_000_000 * PPM_PER_PERCENT;

/// Units of [`ExactMoney`] per cent.
pub const EXACT_UNITS_PER_CENT: i128 = 1_000_000_000_000;

/// A monetary value carried at 10⁻¹² cent.
///
/// ## Exactness
/// ```text
/// subtotal        = cents × 10¹²             (multiple of 10¹²)
/// discount_amount = subtotal × ppm / 10⁶     (multiple of 10⁶, exact)
/// taxable_amount  = subtotal − discount      (multiple of 10⁶)
/// tax_amount      = taxable × ppm / 10⁶      (integer, exact)
/// ```
/// Two successive ppm percentages never need a fractional unit, so nothing
/// is rounded until [`ExactMoney::round_to_cents`]. Every operation is
/// checked; overflow is reported as `InvalidRange` for the named field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ExactMoney(i128);

impl ExactMoney {
    #[inline]
    pub const fn zero() -> Self {
        ExactMoney(0)
    }

    #[inline]
    pub const fn from_money(money: Money) -> Self {
        ExactMoney(money.cents() as i128 * EXACT_UNITS_PER_CENT)
    }

    /// Raw units of 10⁻⁸ cent.
    #[inline]
    pub const fn units(&self) -> i128 {
        self.0
    }

    /// Applies a percentage to this value.
    pub fn percent_of(&self, pct: Percent, field: &str) -> CoreResult<Self> {
        self.0
            .checked_mul(pct.ppm() as i128)
            .map(|scaled| ExactMoney(scaled / Percent::HUNDRED.ppm() as i128))
            .ok_or_else(|| too_large(field))
    }

    pub fn checked_add(&self, other: ExactMoney, field: &str) -> CoreResult<Self> {
        self.0
            .checked_add(other.0)
            .map(ExactMoney)
            .ok_or_else(|| too_large(field))
    }

    pub fn checked_sub(&self, other: ExactMoney, field: &str) -> CoreResult<Self> {
        self.0
            .checked_sub(other.0)
            .map(ExactMoney)
            .ok_or_else(|| too_large(field))
    }

    /// Rounds to whole cents, half away from zero.
    ///
    /// ## Errors
    /// `InvalidRange` if the rounded value does not fit in `Money`.
    pub fn round_to_cents(&self, field: &str) -> CoreResult<Money> {
        let quotient = self.0 / EXACT_UNITS_PER_CENT;
        let remainder = self.0 % EXACT_UNITS_PER_CENT;

        let rounded = if remainder.abs() * 2 >= EXACT_UNITS_PER_CENT {
            quotient + self.0.signum()
        } else {
            quotient
        };

        i64::try_from(rounded)
            .map(Money::from_cents)
            .map_err(|_| too_large(field))
    }
}

fn too_large(field: &str) -> CoreError {
    CoreError::out_of_range(field, "amount is too large")
}

// =============================================================================
// Unit Tests
// =============================================================================
