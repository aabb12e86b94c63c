//! Currency amounts in integer cents.
//!
//! Prices arrive and leave as decimal numbers (`12.99`), but every
//! computation happens on whole cents so a discount can never drift.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use thiserror::Error;

/// Largest decimal amount accepted from the outside world.
const MAX_DECIMAL: f64 = 1.0e13;

/// Errors converting a decimal amount into [`Money`].
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MoneyError {
    /// NaN or infinite input.
    #[error("amount is not a finite number")]
    NotFinite,
    /// Negative input.
    #[error("amount {0} is negative")]
    Negative(f64),
    /// Input too large to represent in cents.
    #[error("amount {0} is out of range")]
    OutOfRange(f64),
}

/// Money amount in cents (to avoid floating point issues)
///
/// Serialized as a decimal number of currency units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(i64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Creates a new money amount from cents
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the value in cents
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns the value in currency units (as floating point)
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // cents fit comfortably in f64's mantissa for display
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parses a decimal amount, rounding to the nearest cent
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError`] for non-finite, negative or oversized input.
    #[allow(clippy::cast_possible_truncation)] // range checked against MAX_DECIMAL
    pub fn from_decimal(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        if value < 0.0 {
            return Err(MoneyError::Negative(value));
        }
        if value > MAX_DECIMAL {
            return Err(MoneyError::OutOfRange(value));
        }
        Ok(Self((value * 100.0).round() as i64))
    }

    /// Amount for `quantity` units at this unit price
    #[must_use]
    pub const fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(quantity as i64))
    }

    /// `percent`% of this amount, rounded half-up to the cent
    #[must_use]
    pub const fn percent(self, percent: u32) -> Self {
        let scaled = self.0.saturating_mul(percent as i64);
        Self(scaled.saturating_add(50).div_euclid(100))
    }

    /// Returns `true` for a zero amount
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl TryFrom<f64> for Money {
    type Error = MoneyError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        f.pad(&format!("{sign}${}.{:02}", abs / 100, abs % 100))
    }
}
