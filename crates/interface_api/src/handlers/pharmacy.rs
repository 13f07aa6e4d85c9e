//! Pharmacy handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use core_kernel::{MedicineId, PrescriptionId};
use infra_db::repositories::{DispensingRepository, MedicineRepository, PrescriptionRepository};
use infra_db::{BillingOrchestrator, DispenseOutcome};

use crate::auth::{Principal, Role};
use crate::dto::pharmacy::*;
use crate::dto::MessageResponse;
use crate::extract::ValidatedJson;
use crate::{error::ApiError, AppState};

/// Dispenses medicine and bills it to the prescription's patient
pub async fn dispense(
    State(state): State<AppState>,
    principal: Principal,
    ValidatedJson(request): ValidatedJson<DispenseRequest>,
) -> Result<(StatusCode, Json<MessageResponse<DispenseOutcome>>), ApiError> {
    principal.require_any(&[Role::Pharmacy])?;

    let outcome = BillingOrchestrator::new(state.pool.clone())
        .dispense(request.into_command(principal.user_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Medicine dispensed and billed", outcome)),
    ))
}

/// Gets the stock line of a medicine
pub async fn get_medicine(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse<MedicineResponse>>, ApiError> {
    principal.require_any(&[Role::Pharmacy, Role::Doctor])?;

    let medicine = MedicineRepository::new(state.pool.clone())
        .get_by_id(MedicineId::from_uuid(id))
        .await?;

    Ok(Json(MessageResponse::new("Medicine retrieved", MedicineResponse { medicine })))
}

/// Gets a prescription's medication lines and what has been dispensed
pub async fn get_prescription(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse<PrescriptionResponse>>, ApiError> {
    principal.require_any(&[Role::Pharmacy, Role::Doctor])?;

    let prescription_id = PrescriptionId::from_uuid(id);
    let prescriptions = PrescriptionRepository::new(state.pool.clone());
    let patient_id = prescriptions
        .patient_of(prescription_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Prescription not found: {}", prescription_id)))?;

    let items = prescriptions.items(prescription_id).await?;
    let dispensed = DispensingRepository::new(state.pool.clone())
        .find_by_prescription(prescription_id)
        .await?;

    Ok(Json(MessageResponse::new(
        "Prescription retrieved",
        PrescriptionResponse {
            prescription_id,
            patient_id,
            items,
            dispensed,
        },
    )))
}
