//! Invoice accumulation rules
//!
//! Charges for a patient accumulate onto the patient's open invoice. This
//! module holds the pure half of that rule: given the locked accumulation
//! target (or its absence) and a charge, it decides what must be written.
//! The database half lives in `infra_db::services::accumulator`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money};

use crate::charge::{append_line, ChargeLine};
use crate::error::BillingResult;

/// Whether a charge extended an open invoice or opened a new one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceActionType {
    Updated,
    Created,
}

/// Outcome reported to callers for every applied charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceAction {
    #[serde(rename = "type")]
    pub action: InvoiceActionType,
    pub invoice_id: InvoiceId,
    pub amount_appended: Money,
    pub updated_total: Money,
}

/// The locked state of an invoice that is about to receive a charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenInvoice {
    pub id: InvoiceId,
    pub amount: Money,
    pub description: Option<String>,
}

/// The write an accumulation step has to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccumulationPlan {
    /// Overwrite amount and description of an existing pending invoice
    Append {
        invoice_id: InvoiceId,
        new_amount: Money,
        new_description: String,
        delta: Money,
    },
    /// Insert a fresh pending invoice
    Create {
        amount: Money,
        description: String,
        due_date: Option<NaiveDate>,
    },
}

impl AccumulationPlan {
    /// Reports the action for a plan once the target invoice id is known
    pub fn into_action(self, created_id: Option<InvoiceId>) -> Option<InvoiceAction> {
        match self {
            AccumulationPlan::Append {
                invoice_id,
                new_amount,
                delta,
                ..
            } => Some(InvoiceAction {
                action: InvoiceActionType::Updated,
                invoice_id,
                amount_appended: delta,
                updated_total: new_amount,
            }),
            AccumulationPlan::Create { amount, .. } => created_id.map(|invoice_id| InvoiceAction {
                action: InvoiceActionType::Created,
                invoice_id,
                amount_appended: amount,
                updated_total: amount,
            }),
        }
    }
}

/// Computes the append write for a specific open invoice
pub fn plan_append(target: &OpenInvoice, charge: &ChargeLine) -> BillingResult<AccumulationPlan> {
    let new_amount = target.amount.checked_add(&charge.amount())?;
    Ok(AccumulationPlan::Append {
        invoice_id: target.id,
        new_amount,
        new_description: append_line(target.description.as_deref(), charge.description()),
        delta: charge.amount(),
    })
}

/// Decides between appending to the open invoice and creating a new one
pub fn plan_accumulation(
    open: Option<&OpenInvoice>,
    charge: &ChargeLine,
    due_date: Option<NaiveDate>,
) -> BillingResult<AccumulationPlan> {
    match open {
        Some(target) => plan_append(target, charge),
        None => Ok(AccumulationPlan::Create {
            amount: charge.amount(),
            description: charge.description().to_string(),
            due_date,
        }),
    }
}
