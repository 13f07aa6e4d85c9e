//! Core Kernel - Foundational types shared by the hospital billing crates
//!
//! This crate provides the fundamental building blocks used across the workspace:
//! - Money values with precise two-place decimal arithmetic
//! - Strongly-typed identifiers for patients, invoices, medicines and lab rows

pub mod money;
pub mod identifiers;

pub use money::{Money, MoneyError, round_currency, MAX_LEDGER_AMOUNT, MONEY_SCALE};
pub use identifiers::{
    UserId, PatientId, InvoiceId, PaymentId,
    MedicineId, PrescriptionId, DispensingRecordId,
    TestRequestId, LabReportId,
};
