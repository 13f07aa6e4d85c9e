//! Prescription repository implementation

use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{MedicineId, PatientId, PrescriptionId};

use crate::error::{empty_if_unprovisioned, DatabaseError};

/// Repository for prescriptions and their medication lines
#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: PgPool,
}

impl PrescriptionRepository {
    /// Creates a new PrescriptionRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the patient a prescription was written for
    pub async fn find_patient(
        conn: &mut PgConnection,
        prescription: PrescriptionId,
    ) -> Result<Option<PatientId>, DatabaseError> {
        let patient: Option<Uuid> =
            sqlx::query_scalar("SELECT patient_id FROM prescriptions WHERE id = $1")
                .bind(*prescription.as_uuid())
                .fetch_optional(&mut *conn)
                .await?;

        Ok(patient.map(PatientId::from_uuid))
    }

    /// Pool-backed form of [`Self::find_patient`] for read paths
    pub async fn patient_of(
        &self,
        prescription: PrescriptionId,
    ) -> Result<Option<PatientId>, DatabaseError> {
        let mut conn = self.pool.acquire().await?;
        Self::find_patient(&mut conn, prescription).await
    }

    /// Lists the medication lines of a prescription
    pub async fn items(
        &self,
        prescription: PrescriptionId,
    ) -> Result<Vec<PrescriptionItem>, DatabaseError> {
        let rows = sqlx::query_as::<_, PrescriptionItemRow>(
            r#"
            SELECT medicine_id, dosage, frequency, duration, quantity
            FROM prescription_items
            WHERE prescription_id = $1
            ORDER BY id
            "#,
        )
        .bind(*prescription.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from);

        Ok(empty_if_unprovisioned(rows)?
            .into_iter()
            .map(|row| PrescriptionItem {
                medicine_id: MedicineId::from_uuid(row.medicine_id),
                dosage: row.dosage,
                frequency: row.frequency,
                duration: row.duration,
                quantity: row.quantity,
            })
            .collect())
    }
}

/// One medication line of a prescription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionItem {
    pub medicine_id: MedicineId,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct PrescriptionItemRow {
    medicine_id: Uuid,
    dosage: Option<String>,
    frequency: Option<String>,
    duration: Option<String>,
    quantity: i32,
}
