//! Payment finalizer
//!
//! Settles an invoice exactly once. The invoice row lock serializes
//! concurrent payment attempts; the loser sees `paid` and is rejected.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::{info, instrument};

use core_kernel::{InvoiceId, Money};
use domain_billing::{settle, BillingError, Invoice, PayerScope, Payment, PaymentMethod};

use super::finish;
use crate::error::LedgerError;
use crate::repositories::{InvoiceRepository, PaymentRepository};

/// Request to pay an invoice
#[derive(Debug, Clone)]
pub struct PaymentCommand {
    pub invoice_id: InvoiceId,
    pub scope: PayerScope,
    pub payment_method: Option<String>,
    /// Recorded instead of the invoice total when present
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub invoice: Invoice,
    pub payment: Payment,
}

#[derive(Debug, Clone)]
pub struct PaymentFinalizer {
    pool: PgPool,
}

impl PaymentFinalizer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Marks the invoice paid and records one payment row
    #[instrument(skip(self, command), fields(invoice = %command.invoice_id))]
    pub async fn pay(&self, command: PaymentCommand) -> Result<PaymentOutcome, LedgerError> {
        let amount = command
            .amount
            .map(Money::positive)
            .transpose()
            .map_err(BillingError::from)?;
        let method = PaymentMethod::normalize(command.payment_method.as_deref());

        let mut tx = self.pool.begin().await?;
        let result = Self::pay_in(&mut tx, &command, method, amount).await;
        finish(tx, result, "pay").await
    }

    async fn pay_in(
        conn: &mut PgConnection,
        command: &PaymentCommand,
        method: PaymentMethod,
        amount: Option<Money>,
    ) -> Result<PaymentOutcome, LedgerError> {
        let invoice = InvoiceRepository::lock_by_id(&mut *conn, command.invoice_id)
            .await?
            .ok_or_else(|| BillingError::not_found("Invoice", command.invoice_id))?;

        let settlement = settle(&invoice, command.scope, method, amount.map(|m| m.amount()))?;
        let invoice = InvoiceRepository::mark_paid(&mut *conn, invoice.id).await?;
        let payment = PaymentRepository::insert(&mut *conn, &settlement).await?;

        info!(
            patient = %invoice.patient_id,
            amount = %payment.amount_paid,
            method = %payment.payment_method,
            "Invoice paid"
        );

        Ok(PaymentOutcome { invoice, payment })
    }
}
