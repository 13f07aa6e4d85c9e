//! Billing transaction orchestrator
//!
//! Composes the inventory guard, the invoice accumulator and the record
//! writes into one unit of work per request. Input that can be judged on
//! its own is validated before a transaction is opened.
//!
//! Lock order inside every operation: the stock or lab row first, the
//! invoice second.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use core_kernel::{InvoiceId, MedicineId, Money, PrescriptionId, UserId};
use domain_billing::charge::DEFAULT_AMENDMENT_LINE;
use domain_billing::{
    ensure_billable, lab_charge_line, parse_due_date, pharmacy_charge_line, BillingError,
    ChargeLine, DispenseQuantity, DispensingRecord, Invoice, InvoiceAction, LabBillingTarget,
};

use super::accumulator::{accumulate, append_to_invoice, verify_patient};
use super::finish;
use super::inventory_guard::reserve_stock;
use crate::error::LedgerError;
use crate::repositories::{
    DispensingRepository, InvoiceRepository, LabBillingRecord, LabRepository, PrescriptionRepository,
};

/// Request to dispense medicine against a prescription
#[derive(Debug, Clone)]
pub struct DispenseCommand {
    pub prescription_id: PrescriptionId,
    pub medicine_id: MedicineId,
    pub quantity: i32,
    /// Overrides `unit_price * quantity` when present
    pub bill_amount: Option<Decimal>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub dispensed_by: UserId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseOutcome {
    pub record: DispensingRecord,
    pub invoice_action: InvoiceAction,
    pub remaining_stock: i32,
    pub charge_amount: Money,
}

/// Request to bill a completed test request or lab report
#[derive(Debug, Clone)]
pub struct LabBillingCommand {
    pub target: LabBillingTarget,
    pub amount: Decimal,
    pub description: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabBillingOutcome {
    pub invoice_action: InvoiceAction,
    pub test: LabBillingRecord,
}

/// Manual charge added to a specific pending invoice
#[derive(Debug, Clone)]
pub struct AmendInvoiceCommand {
    pub invoice_id: InvoiceId,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendmentOutcome {
    pub invoice_action: InvoiceAction,
    pub invoice: Invoice,
}

/// Runs the charge-producing operations of the ledger
#[derive(Debug, Clone)]
pub struct BillingOrchestrator {
    pool: PgPool,
}

impl BillingOrchestrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Dispenses medicine, records the dispense and bills it
    ///
    /// Stock decrement, dispensing record and invoice charge commit
    /// together or not at all.
    #[instrument(
        skip(self, command),
        fields(
            prescription = %command.prescription_id,
            medicine = %command.medicine_id,
            quantity = command.quantity
        )
    )]
    pub async fn dispense(&self, command: DispenseCommand) -> Result<DispenseOutcome, LedgerError> {
        let quantity = DispenseQuantity::new(command.quantity)?;
        let bill_amount = command
            .bill_amount
            .map(Money::positive)
            .transpose()
            .map_err(BillingError::from)?;
        let due_date = parse_due_date(command.due_date.as_deref())?;

        let mut tx = self.pool.begin().await?;
        let result = Self::dispense_in(&mut tx, &command, quantity, bill_amount, due_date).await;
        finish(tx, result, "dispense").await
    }

    async fn dispense_in(
        conn: &mut PgConnection,
        command: &DispenseCommand,
        quantity: DispenseQuantity,
        bill_amount: Option<Money>,
        due_date: Option<NaiveDate>,
    ) -> Result<DispenseOutcome, LedgerError> {
        let patient = PrescriptionRepository::find_patient(&mut *conn, command.prescription_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Prescription", command.prescription_id))?;
        let patient = verify_patient(&mut *conn, patient).await?;

        let (stock, plan) = reserve_stock(
            &mut *conn,
            command.medicine_id,
            quantity,
            bill_amount.map(|amount| amount.amount()),
        )
        .await?;

        let record = DispensingRepository::insert(
            &mut *conn,
            command.prescription_id,
            command.medicine_id,
            quantity.get(),
            command.dispensed_by,
        )
        .await?;

        let charge = ChargeLine::from_money(
            plan.charge_amount,
            command.description.as_deref(),
            pharmacy_charge_line(&stock.name, quantity.get()),
        )?;
        let invoice_action = accumulate(&mut *conn, patient, &charge, due_date).await?;

        info!(
            patient = %patient.id(),
            invoice = %invoice_action.invoice_id,
            charge = %charge.amount(),
            remaining_stock = plan.remaining_stock,
            "Medicine dispensed and billed"
        );

        Ok(DispenseOutcome {
            record,
            invoice_action,
            remaining_stock: plan.remaining_stock,
            charge_amount: charge.amount(),
        })
    }

    /// Bills a completed test request or lab report to the patient
    #[instrument(skip(self, command), fields(target = %command.target))]
    pub async fn bill_lab(&self, command: LabBillingCommand) -> Result<LabBillingOutcome, LedgerError> {
        let amount = Money::positive(command.amount).map_err(BillingError::from)?;
        let due_date = parse_due_date(command.due_date.as_deref())?;

        let mut tx = self.pool.begin().await?;
        let result = Self::bill_lab_in(&mut tx, &command, amount, due_date).await;
        finish(tx, result, "bill_lab").await
    }

    async fn bill_lab_in(
        conn: &mut PgConnection,
        command: &LabBillingCommand,
        amount: Money,
        due_date: Option<NaiveDate>,
    ) -> Result<LabBillingOutcome, LedgerError> {
        let target = command.target;
        let record = LabRepository::lock(&mut *conn, target)
            .await?
            .ok_or_else(|| BillingError::not_found(target.entity(), target))?;
        ensure_billable(target, &record.status)?;

        let patient = verify_patient(&mut *conn, record.patient_id).await?;
        let charge = ChargeLine::from_money(
            amount,
            command.description.as_deref(),
            lab_charge_line(&record.test_type),
        )?;
        let invoice_action = accumulate(&mut *conn, patient, &charge, due_date).await?;
        let test =
            LabRepository::stamp_billing(&mut *conn, target, charge.amount(), invoice_action.invoice_id)
                .await?;

        info!(
            patient = %patient.id(),
            invoice = %invoice_action.invoice_id,
            charge = %charge.amount(),
            "Lab work billed"
        );

        Ok(LabBillingOutcome {
            invoice_action,
            test,
        })
    }

    /// Adds a manual charge line to a pending invoice
    #[instrument(skip(self, command), fields(invoice = %command.invoice_id))]
    pub async fn amend_invoice(
        &self,
        command: AmendInvoiceCommand,
    ) -> Result<AmendmentOutcome, LedgerError> {
        let charge = ChargeLine::new(
            command.amount,
            command.description.as_deref(),
            DEFAULT_AMENDMENT_LINE,
        )?;

        let mut tx = self.pool.begin().await?;
        let result = Self::amend_invoice_in(&mut tx, command.invoice_id, &charge).await;
        finish(tx, result, "amend_invoice").await
    }

    async fn amend_invoice_in(
        conn: &mut PgConnection,
        invoice_id: InvoiceId,
        charge: &ChargeLine,
    ) -> Result<AmendmentOutcome, LedgerError> {
        let invoice = InvoiceRepository::lock_by_id(&mut *conn, invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Invoice", invoice_id))?;

        if !invoice.is_pending() {
            return Err(BillingError::InvoiceNotPending {
                invoice: invoice.id.to_string(),
                status: invoice.status.to_string(),
            }
            .into());
        }

        let (invoice_action, invoice) = append_to_invoice(&mut *conn, &invoice, charge).await?;

        info!(
            invoice = %invoice.id,
            charge = %charge.amount(),
            total = %invoice.amount,
            "Invoice amended"
        );

        Ok(AmendmentOutcome {
            invoice_action,
            invoice,
        })
    }
}
