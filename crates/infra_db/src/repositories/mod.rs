//! Repository implementations for ledger entities
//!
//! Each repository owns the SQL for one table (lab rows share one) and
//! maps between database rows and domain types.
//!
//! # Conventions
//!
//! - Queries are runtime-checked `sqlx::query_as` calls over `FromRow` rows
//! - Associated functions taking `&mut PgConnection` run inside the
//!   caller's transaction; `&self` methods use the pool
//! - `lock_*` functions take a row lock with `FOR UPDATE`

pub mod invoice;
pub mod payment;
pub mod medicine;
pub mod dispensing;
pub mod lab;
pub mod patient;
pub mod prescription;

pub use invoice::{InvoiceRepository, NewInvoice};
pub use payment::PaymentRepository;
pub use medicine::MedicineRepository;
pub use dispensing::DispensingRepository;
pub use lab::{LabBillingRecord, LabRepository};
pub use patient::PatientRepository;
pub use prescription::{PrescriptionItem, PrescriptionRepository};
