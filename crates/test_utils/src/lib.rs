//! Test Utilities Crate
//!
//! Provides shared test infrastructure for the hospital billing ledger.
//!
//! # Modules
//!
//! - `database`: PostgreSQL test containers with the ledger schema applied
//! - `fixtures`: Seed rows for patients, medicines, prescriptions and lab work

pub mod database;
pub mod fixtures;

pub use database::*;
pub use fixtures::*;
