//! Lab test request and lab report repository implementation
//!
//! Test requests and lab reports share the billing columns, so both are
//! served by one repository keyed on [`LabBillingTarget`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use core_kernel::{InvoiceId, Money, PatientId};
use domain_billing::LabBillingTarget;

use crate::error::DatabaseError;

const LOCK_TEST_REQUEST: &str = r#"
    SELECT id, patient_id, test_type AS label, status, billing_amount, billing_invoice_id, billed_at
    FROM test_requests
    WHERE id = $1
    FOR UPDATE
"#;

const LOCK_LAB_REPORT: &str = r#"
    SELECT id, patient_id, report_type AS label, status, billing_amount, billing_invoice_id, billed_at
    FROM lab_reports
    WHERE id = $1
    FOR UPDATE
"#;

const STAMP_TEST_REQUEST: &str = r#"
    UPDATE test_requests
    SET billing_amount = billing_amount + $2, billing_invoice_id = $3, billed_at = $4
    WHERE id = $1
    RETURNING id, patient_id, test_type AS label, status, billing_amount, billing_invoice_id, billed_at
"#;

const STAMP_LAB_REPORT: &str = r#"
    UPDATE lab_reports
    SET billing_amount = billing_amount + $2, billing_invoice_id = $3, billed_at = $4
    WHERE id = $1
    RETURNING id, patient_id, report_type AS label, status, billing_amount, billing_invoice_id, billed_at
"#;

/// Repository for the billable lab rows
pub struct LabRepository;

impl LabRepository {
    /// Locks a test request or lab report
    pub async fn lock(
        conn: &mut PgConnection,
        target: LabBillingTarget,
    ) -> Result<Option<LabBillingRecord>, DatabaseError> {
        let sql = match target {
            LabBillingTarget::TestRequest(_) => LOCK_TEST_REQUEST,
            LabBillingTarget::LabReport(_) => LOCK_LAB_REPORT,
        };

        let row = sqlx::query_as::<_, LabRow>(sql)
            .bind(target.uuid())
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(LabBillingRecord::from))
    }

    /// Adds a billed amount to the row and points it at the charged invoice
    pub async fn stamp_billing(
        conn: &mut PgConnection,
        target: LabBillingTarget,
        delta: Money,
        invoice: InvoiceId,
    ) -> Result<LabBillingRecord, DatabaseError> {
        let sql = match target {
            LabBillingTarget::TestRequest(_) => STAMP_TEST_REQUEST,
            LabBillingTarget::LabReport(_) => STAMP_LAB_REPORT,
        };

        let row = sqlx::query_as::<_, LabRow>(sql)
            .bind(target.uuid())
            .bind(delta.amount())
            .bind(*invoice.as_uuid())
            .bind(Utc::now())
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DatabaseError::not_found(target.entity(), target))?;

        Ok(row.into())
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LabRow {
    id: Uuid,
    patient_id: Uuid,
    label: String,
    status: String,
    billing_amount: Decimal,
    billing_invoice_id: Option<Uuid>,
    billed_at: Option<DateTime<Utc>>,
}

/// Billing view of a test request or lab report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabBillingRecord {
    pub id: Uuid,
    pub patient_id: PatientId,
    /// Test type or report type
    pub test_type: String,
    pub status: String,
    pub billing_amount: Money,
    pub billing_invoice_id: Option<InvoiceId>,
    pub billed_at: Option<DateTime<Utc>>,
}

impl From<LabRow> for LabBillingRecord {
    fn from(row: LabRow) -> Self {
        LabBillingRecord {
            id: row.id,
            patient_id: PatientId::from_uuid(row.patient_id),
            test_type: row.label,
            status: row.status,
            billing_amount: Money::new(row.billing_amount),
            billing_invoice_id: row.billing_invoice_id.map(InvoiceId::from_uuid),
            billed_at: row.billed_at,
        }
    }
}
