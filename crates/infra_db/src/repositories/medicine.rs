//! Medicine stock repository implementation

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{MedicineId, Money};
use domain_billing::StockLine;

use crate::error::DatabaseError;

/// Repository for the medicine inventory
#[derive(Debug, Clone)]
pub struct MedicineRepository {
    pool: PgPool,
}

impl MedicineRepository {
    /// Creates a new MedicineRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reads a medicine stock line without locking it
    pub async fn get_by_id(&self, id: MedicineId) -> Result<StockLine, DatabaseError> {
        let row = sqlx::query_as::<_, MedicineRow>(
            "SELECT id, name, quantity, unit_price FROM medicines WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Medicine", id))?;

        Ok(row.into())
    }

    /// Locks a medicine row for a stock decrement
    pub async fn lock_stock(
        conn: &mut PgConnection,
        id: MedicineId,
    ) -> Result<Option<StockLine>, DatabaseError> {
        let row = sqlx::query_as::<_, MedicineRow>(
            "SELECT id, name, quantity, unit_price FROM medicines WHERE id = $1 FOR UPDATE",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(StockLine::from))
    }

    /// Removes `quantity` units from stock and returns what is left
    ///
    /// The caller must hold the row lock and have checked availability;
    /// the `quantity >= 0` check constraint backs that up.
    pub async fn decrement(
        conn: &mut PgConnection,
        id: MedicineId,
        quantity: i32,
    ) -> Result<i32, DatabaseError> {
        let remaining: i32 = sqlx::query_scalar(
            r#"
            UPDATE medicines
            SET quantity = quantity - $2, updated_at = now()
            WHERE id = $1
            RETURNING quantity
            "#,
        )
        .bind(*id.as_uuid())
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Medicine", id))?;

        Ok(remaining)
    }
}

/// Database row for medicines
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MedicineRow {
    pub id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Option<Decimal>,
}

impl From<MedicineRow> for StockLine {
    fn from(row: MedicineRow) -> Self {
        StockLine {
            id: MedicineId::from_uuid(row.id),
            name: row.name,
            quantity: row.quantity,
            unit_price: row.unit_price.map(Money::new),
        }
    }
}
