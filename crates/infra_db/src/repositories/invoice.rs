//! Invoice repository implementation
//!
//! Pool-backed methods serve read paths. The associated functions taking
//! `&mut PgConnection` are the locking and write steps used inside the
//! ledger transactions.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{InvoiceId, Money, PatientId};
use domain_billing::{BillingError, Invoice, InvoiceStatus, OpenInvoice};

use crate::error::{empty_if_unprovisioned, DatabaseError};

const INVOICE_COLUMNS: &str =
    "id, patient_id, amount, description, due_date, status, created_at, updated_at";

/// Repository for patient invoices
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves an invoice by id
    pub async fn get_by_id(&self, id: InvoiceId) -> Result<Invoice, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        row.try_into()
    }

    /// Lists a patient's invoices, newest first
    ///
    /// A database without the invoices table yields an empty list.
    pub async fn find_by_patient(&self, patient: PatientId) -> Result<Vec<Invoice>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE patient_id = $1 ORDER BY created_at DESC, id DESC",
            INVOICE_COLUMNS
        ))
        .bind(*patient.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from);

        empty_if_unprovisioned(rows)?
            .into_iter()
            .map(Invoice::try_from)
            .collect()
    }

    /// Locks the patient's most recent pending invoice, if there is one
    ///
    /// Recency is `created_at` with the id as tie-break.
    pub async fn lock_latest_pending(
        conn: &mut PgConnection,
        patient: PatientId,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            SELECT {}
            FROM invoices
            WHERE patient_id = $1 AND status = 'pending'
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            FOR UPDATE
            "#,
            INVOICE_COLUMNS
        ))
        .bind(*patient.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// Locks an invoice by id
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        id: InvoiceId,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {} FROM invoices WHERE id = $1 FOR UPDATE",
            INVOICE_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// Inserts a pending invoice unless the patient already has one
    ///
    /// Returns `None` when a concurrent transaction committed a pending
    /// invoice for the same patient first.
    pub async fn insert_pending(
        conn: &mut PgConnection,
        invoice: NewInvoice<'_>,
    ) -> Result<Option<Invoice>, DatabaseError> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices (
                id, patient_id, amount, description, due_date, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, 'pending', $6, $6)
            ON CONFLICT (patient_id) WHERE status = 'pending' DO NOTHING
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(*invoice.patient_id.as_uuid())
        .bind(invoice.amount.amount())
        .bind(invoice.description)
        .bind(invoice.due_date)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(Invoice::try_from).transpose()
    }

    /// Overwrites the running total and description of an invoice
    pub async fn update_charges(
        conn: &mut PgConnection,
        id: InvoiceId,
        amount: Money,
        description: &str,
    ) -> Result<Invoice, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            UPDATE invoices
            SET amount = $2, description = $3, updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(*id.as_uuid())
        .bind(amount.amount())
        .bind(description)
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        row.try_into()
    }

    /// Marks an invoice as paid
    pub async fn mark_paid(conn: &mut PgConnection, id: InvoiceId) -> Result<Invoice, DatabaseError> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            UPDATE invoices
            SET status = 'paid', updated_at = $2
            WHERE id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(*id.as_uuid())
        .bind(Utc::now())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        row.try_into()
    }
}

/// Input for creating a pending invoice
#[derive(Debug, Clone)]
pub struct NewInvoice<'a> {
    pub patient_id: PatientId,
    pub amount: Money,
    pub description: &'a str,
    pub due_date: Option<NaiveDate>,
}

/// Database row for invoices
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DatabaseError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        let status: InvoiceStatus = row
            .status
            .parse()
            .map_err(|e: BillingError| DatabaseError::SerializationError(e.to_string()))?;

        Ok(Invoice {
            id: InvoiceId::from_uuid(row.id),
            patient_id: PatientId::from_uuid(row.patient_id),
            amount: Money::new(row.amount),
            description: row.description,
            due_date: row.due_date,
            status,
            created_at: row.created_at,
        })
    }
}

/// The accumulation view of a locked invoice
pub fn open_invoice(invoice: &Invoice) -> OpenInvoice {
    OpenInvoice {
        id: invoice.id,
        amount: invoice.amount,
        description: invoice.description.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(status: &str) -> InvoiceRow {
        InvoiceRow {
            id: Uuid::now_v7(),
            patient_id: Uuid::new_v4(),
            amount: dec!(35.00),
            description: Some("Lab charge: CBC".to_string()),
            due_date: None,
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_maps_to_domain() {
        let invoice = Invoice::try_from(row("pending")).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.amount.amount(), dec!(35.00));
        assert_eq!(open_invoice(&invoice).id, invoice.id);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = Invoice::try_from(row("draft")).unwrap_err();
        assert!(matches!(err, DatabaseError::SerializationError(_)));
    }
}
