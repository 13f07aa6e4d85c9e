//! Lab billing rules

use std::fmt;

use core_kernel::{LabReportId, TestRequestId};

use crate::error::{BillingError, BillingResult};

/// Status value a lab row must carry before it can be billed
pub const COMPLETED: &str = "completed";

/// The lab row a charge is raised against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabBillingTarget {
    TestRequest(TestRequestId),
    LabReport(LabReportId),
}

impl LabBillingTarget {
    /// Entity name used in messages
    pub fn entity(&self) -> &'static str {
        match self {
            LabBillingTarget::TestRequest(_) => "Test request",
            LabBillingTarget::LabReport(_) => "Lab report",
        }
    }

    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            LabBillingTarget::TestRequest(id) => *id.as_uuid(),
            LabBillingTarget::LabReport(id) => *id.as_uuid(),
        }
    }
}

impl fmt::Display for LabBillingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabBillingTarget::TestRequest(id) => write!(f, "{}", id),
            LabBillingTarget::LabReport(id) => write!(f, "{}", id),
        }
    }
}

/// Only completed lab work can be billed
pub fn ensure_billable(target: LabBillingTarget, status: &str) -> BillingResult<()> {
    if status.trim().eq_ignore_ascii_case(COMPLETED) {
        Ok(())
    } else {
        Err(BillingError::NotBillable {
            target: format!("{} {}", target.entity(), target),
            status: status.to_string(),
        })
    }
}
