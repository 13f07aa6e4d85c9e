//! Invoice accumulator
//!
//! Applies a charge line to the patient's most recent pending invoice, or
//! opens a new pending invoice when there is none. The pending invoice is
//! looked up under lock on every call.

use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::debug;

use core_kernel::PatientId;
use domain_billing::{
    plan_accumulation, plan_append, AccumulationPlan, BillingError, ChargeLine, Invoice,
    InvoiceAction,
};

use crate::error::{DatabaseError, LedgerError};
use crate::repositories::invoice::open_invoice;
use crate::repositories::{InvoiceRepository, NewInvoice, PatientRepository};

/// Rounds of lock-then-create before giving up
const MAX_ACCUMULATION_ROUNDS: usize = 3;

/// A patient whose row was checked inside the current transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedPatient(PatientId);

impl VerifiedPatient {
    pub fn id(&self) -> PatientId {
        self.0
    }
}

/// Confirms the patient exists before any invoice row is touched
pub async fn verify_patient(
    conn: &mut PgConnection,
    patient: PatientId,
) -> Result<VerifiedPatient, LedgerError> {
    if PatientRepository::exists(conn, patient).await? {
        Ok(VerifiedPatient(patient))
    } else {
        Err(BillingError::not_found("Patient", patient).into())
    }
}

/// Adds a charge to the patient's open invoice, creating it if needed
///
/// Creation goes through the one-pending-invoice-per-patient index. If a
/// concurrent transaction commits a pending invoice first, the insert is
/// skipped and the freshly committed invoice is locked and appended to.
pub async fn accumulate(
    conn: &mut PgConnection,
    patient: VerifiedPatient,
    charge: &ChargeLine,
    due_date: Option<NaiveDate>,
) -> Result<InvoiceAction, LedgerError> {
    for round in 1..=MAX_ACCUMULATION_ROUNDS {
        let open = InvoiceRepository::lock_latest_pending(&mut *conn, patient.id())
            .await?
            .map(|invoice| open_invoice(&invoice));
        let plan = plan_accumulation(open.as_ref(), charge, due_date)?;

        let created_id = match &plan {
            AccumulationPlan::Append {
                invoice_id,
                new_amount,
                new_description,
                ..
            } => {
                InvoiceRepository::update_charges(&mut *conn, *invoice_id, *new_amount, new_description)
                    .await?;
                None
            }
            AccumulationPlan::Create {
                amount,
                description,
                due_date,
            } => {
                let new_invoice = NewInvoice {
                    patient_id: patient.id(),
                    amount: *amount,
                    description,
                    due_date: *due_date,
                };
                match InvoiceRepository::insert_pending(&mut *conn, new_invoice).await? {
                    Some(invoice) => Some(invoice.id),
                    None => {
                        debug!(patient = %patient.id(), round, "Pending invoice appeared concurrently, retrying");
                        continue;
                    }
                }
            }
        };

        if let Some(action) = plan.into_action(created_id) {
            debug!(
                patient = %patient.id(),
                invoice = %action.invoice_id,
                action = ?action.action,
                total = %action.updated_total,
                "Charge accumulated"
            );
            return Ok(action);
        }
    }

    Err(DatabaseError::TransactionFailed(format!(
        "no pending invoice could be locked or created for {} after {} rounds",
        patient.id(),
        MAX_ACCUMULATION_ROUNDS
    ))
    .into())
}

/// Appends a charge to a specific invoice the caller has already locked
pub async fn append_to_invoice(
    conn: &mut PgConnection,
    invoice: &Invoice,
    charge: &ChargeLine,
) -> Result<(InvoiceAction, Invoice), LedgerError> {
    let plan = plan_append(&open_invoice(invoice), charge)?;

    let updated = match &plan {
        AccumulationPlan::Append {
            invoice_id,
            new_amount,
            new_description,
            ..
        } => InvoiceRepository::update_charges(conn, *invoice_id, *new_amount, new_description).await?,
        AccumulationPlan::Create { .. } => {
            return Err(DatabaseError::TransactionFailed(format!(
                "append to {} planned a new invoice",
                invoice.id
            ))
            .into())
        }
    };

    let action = plan.into_action(None).ok_or_else(|| {
        DatabaseError::TransactionFailed(format!("append to {} produced no action", invoice.id))
    })?;

    Ok((action, updated))
}
