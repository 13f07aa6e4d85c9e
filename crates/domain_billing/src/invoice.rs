//! Invoice management
//!
//! An invoice accumulates charge lines for one patient while it is
//! `pending` and is settled exactly once by a payment.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{InvoiceId, Money, PatientId};

use crate::error::BillingError;

/// Invoice status
///
/// `Pending → Paid` is the only transition written by the billing core.
/// `Overdue` is normally a read-time label derived from the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Open, still receiving charges
    Pending,
    /// Settled by a payment
    Paid,
    /// Past due date
    Overdue,
    /// Voided
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the value stored in the `invoices.status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            "overdue" => Ok(InvoiceStatus::Overdue),
            "cancelled" => Ok(InvoiceStatus::Cancelled),
            other => Err(BillingError::validation(format!("unknown invoice status '{}'", other))),
        }
    }
}

/// A patient invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// Patient being billed
    pub patient_id: PatientId,
    /// Running total of all charge lines
    pub amount: Money,
    /// Newline-delimited charge lines
    pub description: Option<String>,
    /// Optional payment due date
    pub due_date: Option<NaiveDate>,
    /// Stored status
    pub status: InvoiceStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Returns true if the invoice can still receive charges
    pub fn is_pending(&self) -> bool {
        self.status == InvoiceStatus::Pending
    }

    /// Status shown to readers: a pending invoice past its due date reads
    /// as overdue. The stored status is never rewritten by this.
    pub fn display_status(&self, today: NaiveDate) -> InvoiceStatus {
        match (self.status, self.due_date) {
            (InvoiceStatus::Pending, Some(due)) if today > due => InvoiceStatus::Overdue,
            (status, _) => status,
        }
    }

    /// Iterates the individual charge lines in the order they were added
    pub fn charge_lines(&self) -> impl Iterator<Item = &str> {
        self.description
            .as_deref()
            .unwrap_or_default()
            .lines()
            .filter(|line| !line.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn invoice(status: InvoiceStatus, due: Option<NaiveDate>) -> Invoice {
        Invoice {
            id: InvoiceId::new_v7(),
            patient_id: PatientId::new(),
            amount: Money::new(dec!(35.00)),
            description: Some("Pharmacy charge: Amoxicillin x10\nLab charge: CBC".to_string()),
            due_date: due,
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trips_through_column_value() {
        for status in [
            InvoiceStatus::Pending,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<InvoiceStatus>().unwrap(), status);
        }
        assert!("draft".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn test_overdue_is_derived_for_pending_only() {
        let due = NaiveDate::from_ymd_opt(2026, 1, 31);
        let later = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let on_time = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();

        assert_eq!(invoice(InvoiceStatus::Pending, due).display_status(later), InvoiceStatus::Overdue);
        assert_eq!(invoice(InvoiceStatus::Pending, due).display_status(on_time), InvoiceStatus::Pending);
        assert_eq!(invoice(InvoiceStatus::Paid, due).display_status(later), InvoiceStatus::Paid);
        assert_eq!(invoice(InvoiceStatus::Pending, None).display_status(later), InvoiceStatus::Pending);
    }

    #[test]
    fn test_charge_lines_in_order() {
        let lines: Vec<_> = invoice(InvoiceStatus::Pending, None).charge_lines().map(String::from).collect();
        assert_eq!(lines, vec!["Pharmacy charge: Amoxicillin x10", "Lab charge: CBC"]);
    }
}
