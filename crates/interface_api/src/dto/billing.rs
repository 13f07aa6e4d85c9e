//! Invoice and payment DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::InvoiceId;
use domain_billing::{Invoice, InvoiceStatus, PayerScope, Payment};
use infra_db::{AmendInvoiceCommand, PaymentCommand};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AmendInvoiceRequest {
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl AmendInvoiceRequest {
    pub fn into_command(self, invoice_id: InvoiceId) -> AmendInvoiceCommand {
        AmendInvoiceCommand {
            invoice_id,
            amount: self.amount,
            description: self.description,
        }
    }
}

/// Payment body; every field is optional, `{}` pays the full total in cash
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PayInvoiceRequest {
    #[validate(length(max = 40))]
    pub payment_method: Option<String>,
    pub amount: Option<Decimal>,
}

impl PayInvoiceRequest {
    pub fn into_command(self, invoice_id: InvoiceId, scope: PayerScope) -> PaymentCommand {
        PaymentCommand {
            invoice_id,
            scope,
            payment_method: self.payment_method,
            amount: self.amount,
        }
    }
}

/// Invoice as shown to readers, with the derived display status
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub display_status: InvoiceStatus,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, today: NaiveDate) -> Self {
        let display_status = invoice.display_status(today);
        Self {
            invoice,
            display_status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetailResponse {
    pub invoice: InvoiceView,
    pub payments: Vec<Payment>,
}
