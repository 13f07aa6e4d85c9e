//! Inventory guard rules
//!
//! Stock may never go negative, and a dispense must always be billable.
//! Both checks run against the locked medicine row before anything is
//! written, so a rejection leaves stock and invoices untouched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{DispensingRecordId, MedicineId, Money, PrescriptionId, UserId};

use crate::error::{BillingError, BillingResult};

/// A locked view of one medicine stock line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub id: MedicineId,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Option<Money>,
}

/// A positive dispense quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DispenseQuantity(i32);

impl DispenseQuantity {
    pub fn new(quantity: i32) -> BillingResult<Self> {
        if quantity > 0 {
            Ok(Self(quantity))
        } else {
            Err(BillingError::validation(format!(
                "quantity must be a positive integer, got {}",
                quantity
            )))
        }
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

/// Audit row written for every dispense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispensingRecord {
    pub id: DispensingRecordId,
    pub prescription_id: PrescriptionId,
    pub medicine_id: MedicineId,
    pub quantity_dispensed: i32,
    pub dispensed_by: UserId,
    pub dispensed_at: DateTime<Utc>,
}

/// The approved outcome of a dispense check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispensePlan {
    pub quantity: DispenseQuantity,
    pub remaining_stock: i32,
    pub charge_amount: Money,
}

impl StockLine {
    /// Verifies that `requested` units can leave stock
    ///
    /// Returns the stock left after the decrement.
    pub fn reserve(&self, requested: DispenseQuantity) -> BillingResult<i32> {
        if self.quantity < requested.get() {
            return Err(BillingError::InsufficientStock {
                medicine: self.name.clone(),
                available: self.quantity,
                requested: requested.get(),
            });
        }
        Ok((self.quantity - requested.get()).max(0))
    }

    /// Prices a dispense of `quantity` units
    ///
    /// An explicit bill amount wins. Otherwise the unit price is multiplied
    /// out and rounded; a missing or zero unit price rejects the dispense.
    pub fn price(&self, quantity: DispenseQuantity, bill_amount: Option<Decimal>) -> BillingResult<Money> {
        if let Some(explicit) = bill_amount {
            return Ok(Money::positive(explicit)?);
        }

        match self.unit_price {
            Some(price) if price.is_positive() => {
                let total = price.checked_times(i64::from(quantity.get()))?;
                Ok(Money::positive(total.amount())?)
            }
            _ => Err(BillingError::MissingUnitPrice(self.name.clone())),
        }
    }

    /// Runs both checks and produces the writes a dispense must perform
    pub fn plan_dispense(
        &self,
        quantity: DispenseQuantity,
        bill_amount: Option<Decimal>,
    ) -> BillingResult<DispensePlan> {
        let remaining_stock = self.reserve(quantity)?;
        let charge_amount = self.price(quantity, bill_amount)?;
        Ok(DispensePlan {
            quantity,
            remaining_stock,
            charge_amount,
        })
    }
}
