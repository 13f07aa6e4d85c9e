//! Seed fixtures
//!
//! Inserts the rows the billing ledger reads but never creates: users,
//! patients, medicines, prescriptions and lab work. Every seeded row gets a
//! fresh id, so fixtures never collide within one database.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{
    InvoiceId, LabReportId, MedicineId, PatientId, PrescriptionId, TestRequestId, UserId,
};

/// Inserts a user with the given role
pub async fn seed_user(pool: &PgPool, role: &str) -> Result<UserId, sqlx::Error> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO users (id, name, email, role) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(format!("{} user", role))
        .bind(format!("{}@hospital.test", id))
        .bind(role)
        .execute(pool)
        .await?;
    Ok(UserId::from_uuid(id))
}

/// Inserts a patient together with the user account that owns it
pub async fn seed_patient(pool: &PgPool) -> Result<(UserId, PatientId), sqlx::Error> {
    let user = seed_user(pool, "patient").await?;
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO patients (id, user_id, name) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(*user.as_uuid())
        .bind("Test Patient")
        .execute(pool)
        .await?;
    Ok((user, PatientId::from_uuid(id)))
}

/// Inserts a medicine stock line
pub async fn seed_medicine(
    pool: &PgPool,
    name: &str,
    quantity: i32,
    unit_price: Option<Decimal>,
) -> Result<MedicineId, sqlx::Error> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO medicines (id, name, quantity, unit_price) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(name)
        .bind(quantity)
        .bind(unit_price)
        .execute(pool)
        .await?;
    Ok(MedicineId::from_uuid(id))
}

/// Inserts a prescription with one medication line per `(medicine, quantity)`
pub async fn seed_prescription(
    pool: &PgPool,
    patient: PatientId,
    items: &[(MedicineId, i32)],
) -> Result<PrescriptionId, sqlx::Error> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO prescriptions (id, patient_id, notes) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(*patient.as_uuid())
        .bind("Take with food")
        .execute(pool)
        .await?;

    for (medicine, quantity) in items {
        sqlx::query(
            r#"
            INSERT INTO prescription_items (id, prescription_id, medicine_id, dosage, frequency, duration, quantity)
            VALUES ($1, $2, $3, '500mg', 'twice daily', '5 days', $4)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(id)
        .bind(*medicine.as_uuid())
        .bind(*quantity)
        .execute(pool)
        .await?;
    }

    Ok(PrescriptionId::from_uuid(id))
}

/// Inserts a test request in the given status
pub async fn seed_test_request(
    pool: &PgPool,
    patient: PatientId,
    test_type: &str,
    status: &str,
) -> Result<TestRequestId, sqlx::Error> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO test_requests (id, patient_id, test_type, status) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(*patient.as_uuid())
        .bind(test_type)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(TestRequestId::from_uuid(id))
}

/// Inserts a lab report in the given status
pub async fn seed_lab_report(
    pool: &PgPool,
    patient: PatientId,
    report_type: &str,
    status: &str,
) -> Result<LabReportId, sqlx::Error> {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO lab_reports (id, patient_id, report_type, status) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(*patient.as_uuid())
        .bind(report_type)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(LabReportId::from_uuid(id))
}

/// Current stock of a medicine
pub async fn medicine_quantity(pool: &PgPool, medicine: MedicineId) -> Result<i32, sqlx::Error> {
    sqlx::query_scalar("SELECT quantity FROM medicines WHERE id = $1")
        .bind(*medicine.as_uuid())
        .fetch_one(pool)
        .await
}

/// Number of payment rows recorded against an invoice
pub async fn payment_count(pool: &PgPool, invoice: InvoiceId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM payments WHERE invoice_id = $1")
        .bind(*invoice.as_uuid())
        .fetch_one(pool)
        .await
}

/// Number of invoices a patient has, in any status
pub async fn invoice_count(pool: &PgPool, patient: PatientId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE patient_id = $1")
        .bind(*patient.as_uuid())
        .fetch_one(pool)
        .await
}

/// Number of dispensing rows written for a prescription
pub async fn dispensing_count(pool: &PgPool, prescription: PrescriptionId) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM dispensing_records WHERE prescription_id = $1")
        .bind(*prescription.as_uuid())
        .fetch_one(pool)
        .await
}
