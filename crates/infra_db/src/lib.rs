//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL side of the hospital billing ledger,
//! built on SQLx.
//!
//! # Architecture
//!
//! - **Repositories** own the SQL for one table each and map rows to
//!   domain types. Functions that take `&mut PgConnection` run inside a
//!   caller's transaction; methods on `&self` use the pool directly.
//! - **Services** compose repositories into the transactional operations
//!   of the ledger: dispensing, lab billing, invoice amendment and
//!   payment. Each operation runs in one transaction and either commits
//!   every write or none.
//!
//! # Locking
//!
//! Rows that are read and then rewritten are locked with
//! `SELECT ... FOR UPDATE`. Every operation locks the stock or lab row
//! first and the invoice second, so two operations never wait on each
//! other in opposite order.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, BillingOrchestrator, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/hospital")).await?;
//! run_migrations(&pool).await?;
//! let orchestrator = BillingOrchestrator::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod migrations;
pub mod repositories;
pub mod services;

pub use pool::{DatabasePool, create_pool, DatabaseConfig};
pub use error::{DatabaseError, LedgerError};
pub use migrations::run_migrations;
pub use services::{
    BillingOrchestrator, PaymentFinalizer,
    DispenseCommand, DispenseOutcome, LabBillingCommand, LabBillingOutcome,
    AmendInvoiceCommand, AmendmentOutcome, PaymentCommand, PaymentOutcome,
};
