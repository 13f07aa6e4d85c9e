//! Billing desk handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use core_kernel::InvoiceId;
use domain_billing::PayerScope;
use infra_db::repositories::{InvoiceRepository, PaymentRepository};
use infra_db::{AmendmentOutcome, BillingOrchestrator, PaymentFinalizer, PaymentOutcome};

use crate::auth::{Principal, Role};
use crate::dto::billing::*;
use crate::dto::MessageResponse;
use crate::extract::ValidatedJson;
use crate::{error::ApiError, AppState};

const BILLING_DESK: &[Role] = &[Role::Billing, Role::Staff];

/// Gets an invoice with its payments
pub async fn get_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse<InvoiceDetailResponse>>, ApiError> {
    principal.require_any(BILLING_DESK)?;

    let invoice_id = InvoiceId::from_uuid(id);
    let invoice = InvoiceRepository::new(state.pool.clone()).get_by_id(invoice_id).await?;
    let payments = PaymentRepository::new(state.pool.clone())
        .find_by_invoice(invoice_id)
        .await?;

    Ok(Json(MessageResponse::new(
        "Invoice retrieved",
        InvoiceDetailResponse {
            invoice: InvoiceView::new(invoice, Utc::now().date_naive()),
            payments,
        },
    )))
}

/// Adds a manual charge to a pending invoice
pub async fn amend_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AmendInvoiceRequest>,
) -> Result<Json<MessageResponse<AmendmentOutcome>>, ApiError> {
    principal.require_any(BILLING_DESK)?;

    let outcome = BillingOrchestrator::new(state.pool.clone())
        .amend_invoice(request.into_command(InvoiceId::from_uuid(id)))
        .await?;

    Ok(Json(MessageResponse::new("Invoice updated", outcome)))
}

/// Records payment of any invoice
pub async fn pay_invoice(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<PayInvoiceRequest>,
) -> Result<(StatusCode, Json<MessageResponse<PaymentOutcome>>), ApiError> {
    principal.require_any(BILLING_DESK)?;

    let outcome = PaymentFinalizer::new(state.pool.clone())
        .pay(request.into_command(InvoiceId::from_uuid(id), PayerScope::Staff))
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::new("Payment recorded", outcome))))
}
