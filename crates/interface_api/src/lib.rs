//! HTTP API Layer
//!
//! This crate provides the REST API of the hospital billing ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per desk (pharmacy, lab, billing, patient)
//! - **Middleware**: Authentication, tracing, audit logging
//! - **Extractors**: the verified [`auth::Principal`] and validated JSON bodies
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: `{error, message}` bodies with a status per error kind
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(pool, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{billing, health, lab, patient, pharmacy};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
}

/// Creates the main API router
pub fn create_router(pool: PgPool, config: ApiConfig) -> Router {
    let state = AppState { pool, config };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let pharmacy_routes = Router::new()
        .route("/dispense", post(pharmacy::dispense))
        .route("/medicines/:id", get(pharmacy::get_medicine))
        .route("/prescriptions/:id", get(pharmacy::get_prescription));

    let lab_routes = Router::new()
        .route("/tests/:id/bill", post(lab::bill_test_request))
        .route("/reports/:id/bill", post(lab::bill_lab_report));

    let billing_routes = Router::new()
        .route(
            "/invoices/:id",
            get(billing::get_invoice).put(billing::amend_invoice),
        )
        .route("/invoices/:id/pay", post(billing::pay_invoice));

    let patient_routes = Router::new()
        .route("/invoices", get(patient::list_invoices))
        .route("/invoices/:id/pay", post(patient::pay_invoice));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/pharmacy", pharmacy_routes)
        .nest("/lab", lab_routes)
        .nest("/billing", billing_routes)
        .nest("/patient", patient_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
