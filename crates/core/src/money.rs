//! Monetary amounts in minor units.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Number of minor units per major unit (two decimal places).
pub const MINOR_PER_MAJOR: i64 = 100;

/// Amount of money in minor units (hundredths of the lab's currency).
///
/// Signed because an invoice grand total goes negative when the paid amount
/// exceeds the subtotal.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Whole major units (e.g. `Money::from_major(30)` is 30.00).
    pub const fn from_major(major: i64) -> Self {
        Self(major * MINOR_PER_MAJOR)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Multiply a unit price by a count of units.
    pub fn checked_times(self, count: u64) -> Option<Money> {
        let count = i64::try_from(count).ok()?;
        self.0.checked_mul(count).map(Money)
    }

    /// Parse a user-typed, non-negative decimal amount such as `"30"`,
    /// `"30.5"` or `"30.50"`.
    ///
    /// At most two fractional digits are accepted.
    pub fn parse_input(input: &str) -> DomainResult<Money> {
        let s = input.trim();
        if s.is_empty() {
            return Err(DomainError::validation("amount is empty"));
        }

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(DomainError::validation(format!("'{s}' is not a number")));
        }
        if frac.len() > 2 {
            return Err(DomainError::validation(format!(
                "'{s}' has more than two decimal places"
            )));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| DomainError::validation(format!("'{s}' is out of range")))?;
        let frac_minor: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        whole
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|m| m.checked_add(frac_minor))
            .map(Money)
            .ok_or_else(|| DomainError::validation(format!("'{s}' is out of range")))
    }
}

impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Money::parse_input(s)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}
