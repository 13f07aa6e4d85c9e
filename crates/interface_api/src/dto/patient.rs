//! Patient self-service DTOs

use serde::Serialize;

use super::billing::InvoiceView;

#[derive(Debug, Serialize)]
pub struct InvoiceListResponse {
    pub invoices: Vec<InvoiceView>,
}
