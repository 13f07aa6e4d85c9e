//! Lab billing DTOs

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use domain_billing::LabBillingTarget;
use infra_db::LabBillingCommand;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LabBillRequest {
    #[serde(alias = "billingAmount")]
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub due_date: Option<String>,
}

impl LabBillRequest {
    pub fn into_command(self, target: LabBillingTarget) -> LabBillingCommand {
        LabBillingCommand {
            target,
            amount: self.amount,
            description: self.description,
            due_date: self.due_date,
        }
    }
}
