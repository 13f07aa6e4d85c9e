//! Patient self-service handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::{InvoiceId, PatientId};
use domain_billing::PayerScope;
use infra_db::repositories::{InvoiceRepository, PatientRepository};
use infra_db::{PaymentFinalizer, PaymentOutcome};

use crate::auth::{Principal, Role};
use crate::dto::billing::{InvoiceView, PayInvoiceRequest};
use crate::dto::patient::InvoiceListResponse;
use crate::dto::MessageResponse;
use crate::extract::ValidatedJson;
use crate::{error::ApiError, AppState};

/// Resolves the patient record behind the caller's account
async fn own_patient(state: &AppState, principal: &Principal) -> Result<PatientId, ApiError> {
    principal.require_any(&[Role::Patient])?;

    PatientRepository::new(state.pool.clone())
        .find_by_user(principal.user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("No patient record is linked to this account".to_string()))
}

/// Lists the caller's invoices, newest first
pub async fn list_invoices(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<MessageResponse<InvoiceListResponse>>, ApiError> {
    let patient = own_patient(&state, &principal).await?;
    let today = Utc::now().date_naive();

    let invoices = InvoiceRepository::new(state.pool.clone())
        .find_by_patient(patient)
        .await?
        .into_iter()
        .map(|invoice| InvoiceView::new(invoice, today))
        .collect();

    Ok(Json(MessageResponse::new("Invoices retrieved", InvoiceListResponse { invoices })))
}

/// Pays one of the caller's own invoices
pub async fn pay_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PayInvoiceRequest>,
) -> Result<(StatusCode, Json<MessageResponse<PaymentOutcome>>), ApiError> {
    let patient = own_patient(&state, &principal).await?;

    let outcome = PaymentFinalizer::new(state.pool.clone())
        .pay(request.into_command(InvoiceId::from_uuid(id), PayerScope::Patient(patient)))
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("Payment recorded", outcome))))
}
