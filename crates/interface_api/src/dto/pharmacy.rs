//! Pharmacy DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{MedicineId, PatientId, PrescriptionId, UserId};
use domain_billing::{DispensingRecord, StockLine};
use infra_db::repositories::PrescriptionItem;
use infra_db::DispenseCommand;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    pub prescription_id: Uuid,
    pub medicine_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be a positive integer"))]
    pub quantity: i32,
    /// Charged instead of `unitPrice * quantity` when present
    pub bill_amount: Option<Decimal>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// `YYYY-MM-DD`, used only when a new invoice is opened
    pub due_date: Option<String>,
}

impl DispenseRequest {
    pub fn into_command(self, dispensed_by: UserId) -> DispenseCommand {
        DispenseCommand {
            prescription_id: PrescriptionId::from_uuid(self.prescription_id),
            medicine_id: MedicineId::from_uuid(self.medicine_id),
            quantity: self.quantity,
            bill_amount: self.bill_amount,
            description: self.description,
            due_date: self.due_date,
            dispensed_by,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MedicineResponse {
    pub medicine: StockLine,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionResponse {
    pub prescription_id: PrescriptionId,
    pub patient_id: PatientId,
    pub items: Vec<PrescriptionItem>,
    pub dispensed: Vec<DispensingRecord>,
}
