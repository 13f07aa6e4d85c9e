//! Billing Domain - Invoice, Inventory and Payment Rules
//!
//! This crate holds the pure rules of the hospital billing ledger. Nothing
//! here performs I/O: the database layer locks the rows, hands their state
//! to these functions, and writes back whatever they decide.
//!
//! # Rules
//!
//! - **Accumulation**: every charge for a patient lands on the patient's
//!   most recent pending invoice, or opens a new one
//! - **Inventory**: stock never goes negative and every dispense is billed
//! - **Settlement**: an invoice is paid exactly once
//! - **Lab billing**: only completed lab work is billable
//!
//! # Example
//!
//! ```rust
//! use domain_billing::{ChargeLine, plan_accumulation, AccumulationPlan};
//! use rust_decimal_macros::dec;
//!
//! let charge = ChargeLine::new(dec!(20), None, "Pharmacy charge: Amoxicillin x10").unwrap();
//! let plan = plan_accumulation(None, &charge, None).unwrap();
//! assert!(matches!(plan, AccumulationPlan::Create { .. }));
//! ```

pub mod accumulator;
pub mod charge;
pub mod inventory;
pub mod invoice;
pub mod lab;
pub mod payment;
pub mod error;

pub use accumulator::{
    plan_accumulation, plan_append, AccumulationPlan, InvoiceAction, InvoiceActionType, OpenInvoice,
};
pub use charge::{append_line, lab_charge_line, parse_due_date, pharmacy_charge_line, ChargeLine};
pub use inventory::{DispensePlan, DispenseQuantity, DispensingRecord, StockLine};
pub use invoice::{Invoice, InvoiceStatus};
pub use lab::{ensure_billable, LabBillingTarget};
pub use payment::{settle, PayerScope, Payment, PaymentMethod, Settlement};
pub use error::{BillingError, BillingResult, ErrorKind};
