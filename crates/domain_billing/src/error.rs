//! Billing domain errors

use core_kernel::MoneyError;
use thiserror::Error;

/// Coarse classification used by outer layers to pick a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input
    Validation,
    /// A referenced row does not exist (or is not visible to the caller)
    NotFound,
    /// The request is well-formed but conflicts with current state
    Conflict,
}

/// Errors that can occur in the billing domain
#[derive(Debug, Error, PartialEq)]
pub enum BillingError {
    /// Input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Charge or payment amount is unusable
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    /// Due date was not a `YYYY-MM-DD` calendar date
    #[error("Invalid due date '{0}', expected YYYY-MM-DD")]
    InvalidDueDate(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Stock on hand does not cover the requested quantity
    #[error("Insufficient stock for {medicine}: {available} available, {requested} requested")]
    InsufficientStock {
        medicine: String,
        available: i32,
        requested: i32,
    },

    /// Neither a unit price nor an explicit bill amount is available
    #[error("Medicine {0} has no unit price; supply a bill amount")]
    MissingUnitPrice(String),

    /// Invoice has already been settled
    #[error("Invoice {0} is already paid")]
    AlreadyPaid(String),

    /// Invoice cannot receive further charges
    #[error("Invoice {invoice} is {status} and cannot be amended")]
    InvoiceNotPending { invoice: String, status: String },

    /// Lab row is not in a billable state
    #[error("{target} is {status}; only completed work can be billed")]
    NotBillable { target: String, status: String },
}

impl BillingError {
    /// Creates a not found error for a specific entity type and identifier
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        BillingError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Validation(_)
            | BillingError::InvalidAmount(_)
            | BillingError::InvalidDueDate(_)
            | BillingError::MissingUnitPrice(_) => ErrorKind::Validation,
            BillingError::NotFound { .. } => ErrorKind::NotFound,
            BillingError::InsufficientStock { .. }
            | BillingError::AlreadyPaid(_)
            | BillingError::InvoiceNotPending { .. }
            | BillingError::NotBillable { .. } => ErrorKind::Conflict,
        }
    }
}

/// Result alias for billing rules
pub type BillingResult<T> = Result<T, BillingError>;
