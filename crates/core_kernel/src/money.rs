//! Money types with precise decimal arithmetic
//!
//! This module provides a type-safe representation of monetary values
//! using rust_decimal for precise calculations without floating-point errors.
//!
//! The hospital bills in a single currency, so `Money` carries no currency
//! tag. Every value is held at two decimal places, rounded half away from
//! zero, which is the precision stored in the ledger tables.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};
use thiserror::Error;

/// Number of decimal places stored for every monetary amount
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a ledger column can hold, `NUMERIC(12, 2)`: 9999999999.99
pub const MAX_LEDGER_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, MONEY_SCALE);

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be positive, got {0}")]
    NotPositive(Decimal),

    #[error("Overflow during calculation")]
    Overflow,

    #[error("Amount {0} exceeds the ledger maximum of {max}", max = MAX_LEDGER_AMOUNT)]
    OutOfRange(Decimal),
}

/// A monetary amount rounded to two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a new Money value, rounding to two decimal places
    pub fn new(amount: Decimal) -> Self {
        Self(round_currency(amount))
    }

    /// Creates a strictly positive amount, used for charges and payments
    ///
    /// Precision drift beyond two places is rounded away rather than
    /// rejected; an amount that rounds to zero is rejected, and so is one
    /// above [`MAX_LEDGER_AMOUNT`].
    pub fn positive(amount: Decimal) -> Result<Self, MoneyError> {
        let money = Self::new(amount);
        if !money.is_positive() {
            return Err(MoneyError::NotPositive(amount));
        }
        money.within_ledger_range()
    }

    /// Rejects amounts a ledger column cannot store
    pub fn within_ledger_range(self) -> Result<Self, MoneyError> {
        if self.0.abs() > MAX_LEDGER_AMOUNT {
            Err(MoneyError::OutOfRange(self.0))
        } else {
            Ok(self)
        }
    }

    /// Parses a decimal string such as `"19.99"`
    pub fn parse(raw: &str) -> Result<Self, MoneyError> {
        raw.trim()
            .parse::<Decimal>()
            .map(Self::new)
            .map_err(|_| MoneyError::InvalidAmount(raw.to_string()))
    }

    /// Creates Money from an integer amount in minor units (cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, MONEY_SCALE))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self(Decimal::new(0, MONEY_SCALE))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is positive
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Checked addition bounded by the ledger's column range
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)?
            .within_ledger_range()
    }

    /// Multiplies a unit price by a quantity, rounding the line total
    pub fn checked_times(&self, quantity: i64) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .map(Self::new)
            .ok_or(MoneyError::Overflow)?
            .within_ledger_range()
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Decimal {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, quantity: i64) -> Self {
        Self::new(self.0 * Decimal::from(quantity))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Rounds a raw decimal to the ledger's two decimal places
pub fn round_currency(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_sum_matches_minor_unit_sum(
            cents in proptest::collection::vec(1i64..10_000_000i64, 1..50)
        ) {
            let total: Money = cents.iter().map(|c| Money::from_minor(*c)).sum();
            prop_assert_eq!(total, Money::from_minor(cents.iter().sum()));
        }

        #[test]
        fn money_arithmetic_is_associative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64,
            c in -1_000_000i64..1_000_000i64
        ) {
            let ma = Money::from_minor(a);
            let mb = Money::from_minor(b);
            let mc = Money::from_minor(c);

            prop_assert_eq!((ma + mb) + mc, ma + (mb + mc));
        }
    }
}
