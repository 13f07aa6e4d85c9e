//! Payment repository implementation

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{InvoiceId, Money, PaymentId};
use domain_billing::{Payment, PaymentMethod, Settlement};

use crate::error::{empty_if_unprovisioned, DatabaseError};

/// Repository for payments
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists the payments recorded against an invoice
    pub async fn find_by_invoice(&self, invoice: InvoiceId) -> Result<Vec<Payment>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, invoice_id, amount_paid, payment_method, payment_date
            FROM payments
            WHERE invoice_id = $1
            ORDER BY payment_date
            "#,
        )
        .bind(*invoice.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from);

        Ok(empty_if_unprovisioned(rows)?
            .into_iter()
            .map(Payment::from)
            .collect())
    }

    /// Records the payment row of a settlement
    pub async fn insert(
        conn: &mut PgConnection,
        settlement: &Settlement,
    ) -> Result<Payment, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (id, invoice_id, amount_paid, payment_method, payment_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invoice_id, amount_paid, payment_method, payment_date
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(*settlement.invoice_id.as_uuid())
        .bind(settlement.amount_paid.amount())
        .bind(settlement.payment_method.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.into())
    }
}

/// Database row for payments
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount_paid: Decimal,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: PaymentId::from_uuid(row.id),
            invoice_id: InvoiceId::from_uuid(row.invoice_id),
            amount_paid: Money::new(row.amount_paid),
            payment_method: PaymentMethod::normalize(Some(&row.payment_method)),
            payment_date: row.payment_date,
        }
    }
}
