//! Amounts of money as whole cents.
//!
//! Prices, sale totals and revenue are `i64` cents everywhere. Decimal text
//! such as `12.50` only appears at the edges: CLI arguments, CSV files and
//! the `Display` form.
//!
//! ```rust
//! use stockpile_core::money::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! assert_eq!(price.checked_multiply_quantity(2), Some(Money::from_cents(2198)));
//! assert_eq!(price.to_string(), "10.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use crate::error::ValidationError;

/// Serialized as the bare cent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub const fn zero() -> Self {
        Money(0)
    }

    /// `None` when the product does not fit in an `i64`.
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// `None` when the sum does not fit in an `i64`.
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums `amounts`, or `None` on overflow. Ledger totals go through
    /// this instead of `+`.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |total, amount| total.checked_add(amount))
    }
}

/// At most two fractional digits. A leading `-` parses; validation is what
/// rejects negative prices.
///
/// ```text
/// "12"     → 1200
/// "12.5"   → 1250
/// "12.50"  → 1250
/// ".99"    → 99
/// "-3.10"  → -310
/// "12.505" → error (sub-cent precision)
/// "abc"    → error
/// ```
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (major, minor) = digits.split_once('.').unwrap_or((digits, ""));

        if major.is_empty() && minor.is_empty() {
            return Err(invalid("expected a decimal amount such as 12.50"));
        }
        if !major.bytes().all(|b| b.is_ascii_digit()) || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected a decimal amount such as 12.50"));
        }
        if minor.len() > 2 {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let too_large = || invalid("amount is too large");
        let major: i64 = if major.is_empty() {
            0
        } else {
            major.parse().map_err(|_| too_large())?
        };
        let minor: i64 = match minor.len() {
            0 => 0,
            1 => minor.parse::<i64>().map_err(|_| too_large())? * 10,
            _ => minor.parse().map_err(|_| too_large())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(too_large)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

/// `12.50`, the form CSV export writes.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

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

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}
