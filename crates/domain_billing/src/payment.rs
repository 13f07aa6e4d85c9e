//! Payment processing
//!
//! A payment settles an invoice in full exactly once. This module holds
//! the method normalization and the settlement rule applied to the locked
//! invoice row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{InvoiceId, Money, PaymentId, PatientId};

use crate::error::{BillingError, BillingResult};
use crate::invoice::{Invoice, InvoiceStatus};

/// Method recorded when the caller does not name one
pub const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// Payment method as a normalized lower-snake token, e.g. `credit_card`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(String);

impl PaymentMethod {
    /// Normalizes free-form input: trimmed, lower-cased, and every run of
    /// non-alphanumeric characters collapsed to one underscore. Absent or
    /// blank input falls back to [`DEFAULT_PAYMENT_METHOD`].
    pub fn normalize(raw: Option<&str>) -> Self {
        let mut token = String::new();
        let mut pending_separator = false;
        for c in raw.unwrap_or_default().trim().chars() {
            if c.is_alphanumeric() {
                if pending_separator && !token.is_empty() {
                    token.push('_');
                }
                pending_separator = false;
                token.extend(c.to_lowercase());
            } else {
                pending_separator = true;
            }
        }

        if token.is_empty() {
            Self(DEFAULT_PAYMENT_METHOD.to_string())
        } else {
            Self(token)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// Invoice settled by this payment
    pub invoice_id: InvoiceId,
    /// Amount received
    pub amount_paid: Money,
    /// Normalized method token
    pub payment_method: PaymentMethod,
    /// When the payment was taken
    pub payment_date: DateTime<Utc>,
}

/// Who is asking to settle an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayerScope {
    /// Billing desk or admin; may settle any invoice
    Staff,
    /// A patient settling their own invoice
    Patient(PatientId),
}

/// The writes a successful settlement performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub invoice_id: InvoiceId,
    pub amount_paid: Money,
    pub payment_method: PaymentMethod,
}

/// Checks a locked invoice against the payment rules
///
/// An invoice owned by someone else reads as not found so its existence
/// is not revealed to the caller.
pub fn settle(
    invoice: &Invoice,
    scope: PayerScope,
    method: PaymentMethod,
    amount_override: Option<Decimal>,
) -> BillingResult<Settlement> {
    if let PayerScope::Patient(patient) = scope {
        if invoice.patient_id != patient {
            return Err(BillingError::not_found("Invoice", invoice.id));
        }
    }

    match invoice.status {
        InvoiceStatus::Paid => return Err(BillingError::AlreadyPaid(invoice.id.to_string())),
        InvoiceStatus::Cancelled => {
            return Err(BillingError::InvoiceNotPending {
                invoice: invoice.id.to_string(),
                status: invoice.status.to_string(),
            })
        }
        InvoiceStatus::Pending | InvoiceStatus::Overdue => {}
    }

    let amount_paid = match amount_override {
        Some(amount) => Money::positive(amount)?,
        None => invoice.amount,
    };

    Ok(Settlement {
        invoice_id: invoice.id,
        amount_paid,
        payment_method: method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pending_invoice(patient: PatientId) -> Invoice {
        Invoice {
            id: InvoiceId::new_v7(),
            patient_id: patient,
            amount: Money::new(dec!(35.00)),
            description: Some("Lab charge: CBC".to_string()),
            due_date: None,
            status: InvoiceStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_payment_method() {
        assert_eq!(PaymentMethod::normalize(Some("Credit Card")).as_str(), "credit_card");
        assert_eq!(PaymentMethod::normalize(Some("  mobile-money!! ")).as_str(), "mobile_money");
        assert_eq!(PaymentMethod::normalize(Some("UPI")).as_str(), "upi");
        assert_eq!(PaymentMethod::normalize(Some("   ")).as_str(), "cash");
        assert_eq!(PaymentMethod::normalize(None).as_str(), "cash");
    }

    #[test]
    fn test_settle_defaults_to_invoice_total() {
        let patient = PatientId::new();
        let invoice = pending_invoice(patient);
        let settlement = settle(&invoice, PayerScope::Patient(patient), PaymentMethod::normalize(None), None).unwrap();
        assert_eq!(settlement.amount_paid.amount(), dec!(35.00));
        assert_eq!(settlement.payment_method.as_str(), "cash");
    }

    #[test]
    fn test_settle_with_override() {
        let invoice = pending_invoice(PatientId::new());
        let settlement = settle(&invoice, PayerScope::Staff, PaymentMethod::normalize(Some("card")), Some(dec!(30))).unwrap();
        assert_eq!(settlement.amount_paid.amount(), dec!(30.00));
        assert!(settle(&invoice, PayerScope::Staff, PaymentMethod::normalize(None), Some(dec!(0))).is_err());
    }

    #[test]
    fn test_settle_rejects_paid_invoice() {
        let mut invoice = pending_invoice(PatientId::new());
        invoice.status = InvoiceStatus::Paid;
        let err = settle(&invoice, PayerScope::Staff, PaymentMethod::normalize(None), None).unwrap_err();
        assert!(matches!(err, BillingError::AlreadyPaid(_)));
    }

    #[test]
    fn test_settle_hides_foreign_invoice() {
        let invoice = pending_invoice(PatientId::new());
        let err = settle(&invoice, PayerScope::Patient(PatientId::new()), PaymentMethod::normalize(None), None).unwrap_err();
        assert!(matches!(err, BillingError::NotFound { entity: "Invoice", .. }));
    }
}
