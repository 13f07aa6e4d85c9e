//! Transactional ledger services
//!
//! Every public operation here opens one transaction, passes the handle
//! explicitly through each step and either commits all writes or rolls
//! all of them back.

pub mod accumulator;
pub mod inventory_guard;
pub mod orchestrator;
pub mod payment_finalizer;

pub use accumulator::{accumulate, append_to_invoice, verify_patient, VerifiedPatient};
pub use inventory_guard::reserve_stock;
pub use orchestrator::{
    AmendInvoiceCommand, AmendmentOutcome, BillingOrchestrator, DispenseCommand, DispenseOutcome,
    LabBillingCommand, LabBillingOutcome,
};
pub use payment_finalizer::{PaymentCommand, PaymentFinalizer, PaymentOutcome};

use sqlx::{Postgres, Transaction};
use tracing::{debug, warn};

use crate::error::LedgerError;

/// Commits on success and rolls back on failure
///
/// A failed rollback is logged and the original error is returned; the
/// connection is discarded by the pool in that case.
pub(crate) async fn finish<T>(
    tx: Transaction<'_, Postgres>,
    result: Result<T, LedgerError>,
    operation: &'static str,
) -> Result<T, LedgerError> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            debug!(operation, "Transaction committed");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(operation, error = %rollback_err, "Rollback failed");
            }
            debug!(operation, error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}
