//! Dispensing record repository implementation

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{DispensingRecordId, MedicineId, PrescriptionId, UserId};
use domain_billing::DispensingRecord;

use crate::error::{empty_if_unprovisioned, DatabaseError};

/// Repository for dispensing audit rows
#[derive(Debug, Clone)]
pub struct DispensingRepository {
    pool: PgPool,
}

impl DispensingRepository {
    /// Creates a new DispensingRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists what has been dispensed against a prescription
    pub async fn find_by_prescription(
        &self,
        prescription: PrescriptionId,
    ) -> Result<Vec<DispensingRecord>, DatabaseError> {
        let rows = sqlx::query_as::<_, DispensingRow>(
            r#"
            SELECT id, prescription_id, medicine_id, quantity_dispensed, dispensed_by, dispensed_at
            FROM dispensing_records
            WHERE prescription_id = $1
            ORDER BY dispensed_at, id
            "#,
        )
        .bind(*prescription.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from);

        Ok(empty_if_unprovisioned(rows)?
            .into_iter()
            .map(DispensingRecord::from)
            .collect())
    }

    /// Writes the audit row for a dispense
    pub async fn insert(
        conn: &mut PgConnection,
        prescription: PrescriptionId,
        medicine: MedicineId,
        quantity: i32,
        dispensed_by: UserId,
    ) -> Result<DispensingRecord, DatabaseError> {
        let row = sqlx::query_as::<_, DispensingRow>(
            r#"
            INSERT INTO dispensing_records (
                id, prescription_id, medicine_id, quantity_dispensed, dispensed_by, dispensed_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, prescription_id, medicine_id, quantity_dispensed, dispensed_by, dispensed_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(*prescription.as_uuid())
        .bind(*medicine.as_uuid())
        .bind(quantity)
        .bind(*dispensed_by.as_uuid())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        Ok(row.into())
    }
}

/// Database row for dispensing records
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DispensingRow {
    pub id: Uuid,
    pub prescription_id: Uuid,
    pub medicine_id: Uuid,
    pub quantity_dispensed: i32,
    pub dispensed_by: Uuid,
    pub dispensed_at: DateTime<Utc>,
}

impl From<DispensingRow> for DispensingRecord {
    fn from(row: DispensingRow) -> Self {
        DispensingRecord {
            id: DispensingRecordId::from_uuid(row.id),
            prescription_id: PrescriptionId::from_uuid(row.prescription_id),
            medicine_id: MedicineId::from_uuid(row.medicine_id),
            quantity_dispensed: row.quantity_dispensed,
            dispensed_by: UserId::from_uuid(row.dispensed_by),
            dispensed_at: row.dispensed_at,
        }
    }
}
