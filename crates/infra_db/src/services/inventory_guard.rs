//! Inventory guard
//!
//! Locks the medicine row, checks availability and price against the
//! locked quantity, then decrements. A rejection happens before the
//! decrement, so stock is untouched on failure.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use tracing::debug;

use core_kernel::MedicineId;
use domain_billing::{BillingError, DispensePlan, DispenseQuantity, StockLine};

use crate::error::LedgerError;
use crate::repositories::MedicineRepository;

/// Reserves and removes `quantity` units of a medicine
///
/// Returns the stock line as it was when locked together with the approved
/// plan carrying the post-decrement stock level.
pub async fn reserve_stock(
    conn: &mut PgConnection,
    medicine: MedicineId,
    quantity: DispenseQuantity,
    bill_amount: Option<Decimal>,
) -> Result<(StockLine, DispensePlan), LedgerError> {
    let stock = MedicineRepository::lock_stock(&mut *conn, medicine)
        .await?
        .ok_or_else(|| BillingError::not_found("Medicine", medicine))?;

    let plan = stock.plan_dispense(quantity, bill_amount)?;
    let remaining_stock = MedicineRepository::decrement(&mut *conn, medicine, quantity.get()).await?;

    debug!(
        medicine = %medicine,
        before = stock.quantity,
        remaining = remaining_stock,
        "Stock decremented"
    );

    Ok((
        stock,
        DispensePlan {
            remaining_stock,
            ..plan
        },
    ))
}
