//! Patient lookups used by the ledger

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{PatientId, UserId};

use crate::error::DatabaseError;

/// Repository for patient identity
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: PgPool,
}

impl PatientRepository {
    /// Creates a new PatientRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolves the patient record linked to a user account
    pub async fn find_by_user(&self, user: UserId) -> Result<Option<PatientId>, DatabaseError> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM patients WHERE user_id = $1")
            .bind(*user.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        Ok(id.map(PatientId::from_uuid))
    }

    /// Checks that a patient row exists
    pub async fn exists(conn: &mut PgConnection, patient: PatientId) -> Result<bool, DatabaseError> {
        let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM patients WHERE id = $1)")
            .bind(*patient.as_uuid())
            .fetch_one(&mut *conn)
            .await?;

        Ok(found)
    }
}
