//! Lab billing handlers

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use core_kernel::{LabReportId, TestRequestId};
use domain_billing::LabBillingTarget;
use infra_db::{BillingOrchestrator, LabBillingOutcome};

use crate::auth::{Principal, Role};
use crate::dto::lab::LabBillRequest;
use crate::dto::MessageResponse;
use crate::extract::ValidatedJson;
use crate::{error::ApiError, AppState};

/// Bills a completed test request
pub async fn bill_test_request(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<LabBillRequest>,
) -> Result<Json<MessageResponse<LabBillingOutcome>>, ApiError> {
    bill(state, principal, LabBillingTarget::TestRequest(TestRequestId::from_uuid(id)), request).await
}

/// Bills a completed lab report
pub async fn bill_lab_report(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<LabBillRequest>,
) -> Result<Json<MessageResponse<LabBillingOutcome>>, ApiError> {
    bill(state, principal, LabBillingTarget::LabReport(LabReportId::from_uuid(id)), request).await
}

async fn bill(
    state: AppState,
    principal: Principal,
    target: LabBillingTarget,
    request: LabBillRequest,
) -> Result<Json<MessageResponse<LabBillingOutcome>>, ApiError> {
    principal.require_any(&[Role::Lab])?;

    let outcome = BillingOrchestrator::new(state.pool)
        .bill_lab(request.into_command(target))
        .await?;

    Ok(Json(MessageResponse::new("Lab charge added to invoice", outcome)))
}
