//! # Money Module
//!
//! Provides the `Money` type for balances and transaction amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With binary floating point:                                            │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A ledger that stores balances as doubles slowly creates or destroys   │
//! │  money, one rounding error at a time.                                   │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    500.00 is stored as 50000 cents                                      │
//! │    Every amount is an exact multiple of 0.01 by construction            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! // Create from cents (preferred)
//! let balance = Money::from_cents(50_000); // 500.00
//!
//! // Or parse caller-supplied decimal text
//! let amount: Money = "400.00".parse().unwrap();
//!
//! assert_eq!((balance - amount).cents(), 10_000);
//!
//! // Non-quantized input is rejected, never rounded
//! assert!("0.001".parse::<Money>().is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::error::AmountIssue;

/// Number of minor units in one major unit (cents per dollar).
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Number of fractional digits an amount may carry.
pub const SCALE: usize = 2;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Differences between balances may be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support; serialises as the raw cent count
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                    Where Money is Used                                  │
/// │                                                                         │
/// │  Caller text "400.00" ──► parse_amount ──► Money ──► engine operation   │
/// │                                                                         │
/// │  Account.balance ──┬──► floor check (balance - amount >= minimum)      │
/// │                    │                                                    │
/// │                    └──► BalanceUpdate ──► LedgerStore::commit           │
/// │                                                                         │
/// │  Transaction.amount ──► LedgerEvent.amount ──► notification relay       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let amount = Money::from_cents(1099); // Represents 10.99
    /// assert_eq!(amount.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let amount = Money::from_major_minor(500, 0);
    /// assert_eq!(amount.cents(), 50_000);
    ///
    /// let negative = Money::from_major_minor(-5, 50);
    /// assert_eq!(negative.cents(), -550);
    /// ```
    ///
    /// ## Note
    /// For negative amounts, only the major unit should be negative.
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * MINOR_UNITS_PER_MAJOR - minor)
        } else {
            Money(major * MINOR_UNITS_PER_MAJOR + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_UNITS_PER_MAJOR
    }

    /// Returns the minor unit portion (always 0-99).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).minor_part(), 99);
    /// assert_eq!(Money::from_cents(-550).minor_part(), 50); // Absolute value
    /// ```
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_UNITS_PER_MAJOR).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Smallest representable positive amount (0.01).
    #[inline]
    pub const fn minor_unit() -> Self {
        Money(1)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Checked addition. Returns `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(
    ///     Money::from_cents(100).checked_add(Money::from_cents(50)),
    ///     Some(Money::from_cents(150))
    /// );
    /// assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::minor_unit()), None);
    /// ```
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Checked subtraction. Returns `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Returns `basis_points / 10000` of this amount, rounded half away from zero.
    ///
    /// Used by the alert policy to compare a withdrawal against a share of
    /// the balance it was taken from.
    pub fn percentage_bps(&self, basis_points: u32) -> Money {
        let scaled = self.0 as i128 * basis_points as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5000) / 10000
        } else {
            (scaled - 5000) / 10000
        };
        Money(rounded as i64)
    }

    /// Parses a decimal amount string without rounding.
    ///
    /// ## Rules
    /// - Optional leading `-`
    /// - Digits, optionally followed by `.` and at most two digits
    /// - More than two fractional digits is `NotQuantized`, never rounded
    /// - Anything else is `Malformed`
    pub fn parse_decimal(text: &str) -> Result<Money, AmountIssue> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(AmountIssue::Malformed);
        }
        if digits.ends_with('.') {
            return Err(AmountIssue::Malformed);
        }
        if fraction.len() > SCALE {
            // "1.000" is rejected too: callers quantize, we don't.
            return Err(AmountIssue::NotQuantized);
        }

        let major: i64 = whole.parse().map_err(|_| AmountIssue::Overflow)?;
        let mut minor: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| AmountIssue::Malformed)?
        };
        if fraction.len() == 1 {
            minor *= 10;
        }

        let cents = major
            .checked_mul(MINOR_UNITS_PER_MAJOR)
            .and_then(|c| c.checked_add(minor))
            .ok_or(AmountIssue::Overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with two decimals, e.g. `$500.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl FromStr for Money {
    type Err = AmountIssue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_decimal(s)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(50_000)), "$500.00");
        assert_eq!(format!("{}", Money::from_cents(1)), "$0.01");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_parse_accepts_quantized_amounts() {
        assert_eq!("500".parse::<Money>().unwrap().cents(), 50_000);
        assert_eq!("500.5".parse::<Money>().unwrap().cents(), 50_050);
        assert_eq!("500.50".parse::<Money>().unwrap().cents(), 50_050);
        assert_eq!("0.01".parse::<Money>().unwrap().cents(), 1);
        assert_eq!(" 12.30 ".parse::<Money>().unwrap().cents(), 1230);
        assert_eq!("-5.50".parse::<Money>().unwrap().cents(), -550);
    }

    #[test]
    fn test_parse_rejects_sub_cent_precision() {
        assert_eq!("0.001".parse::<Money>(), Err(AmountIssue::NotQuantized));
        assert_eq!("10.125".parse::<Money>(), Err(AmountIssue::NotQuantized));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "abc", "1.2.3", ".50", "5.", "1e3", "--1", "12,00"] {
            assert_eq!(bad.parse::<Money>(), Err(AmountIssue::Malformed), "{bad}");
        }
        assert_eq!(
            "99999999999999999999".parse::<Money>(),
            Err(AmountIssue::Overflow)
        );
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(b.checked_sub(a), Some(Money::from_cents(-500)));
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(b), None);
    }

    #[test]
    fn test_percentage_bps() {
        let balance = Money::from_cents(50_000);
        assert_eq!(balance.percentage_bps(8000).cents(), 40_000);
        assert_eq!(Money::from_cents(1).percentage_bps(5000).cents(), 1);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(Money::minor_unit().is_positive());
        assert!(Money::from_cents(-100).is_negative());
        assert_eq!(Money::from_cents(-100).abs().cents(), 100);
    }
}
