//! Database-backed tests for the transactional ledger services
//!
//! Each test starts its own PostgreSQL container and returns early when no
//! container runtime is available.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;

use core_kernel::{InvoiceId, MedicineId, PatientId, PrescriptionId, TestRequestId, UserId};
use domain_billing::{
    BillingError, ErrorKind, InvoiceActionType, InvoiceStatus, LabBillingTarget, PayerScope,
};
use infra_db::repositories::{DispensingRepository, InvoiceRepository, PrescriptionRepository};
use infra_db::{
    AmendInvoiceCommand, BillingOrchestrator, DispenseCommand, LabBillingCommand, LedgerError,
    PaymentCommand, PaymentFinalizer,
};
use test_utils::{
    db_test, dispensing_count, invoice_count, medicine_quantity, payment_count, seed_lab_report,
    seed_medicine, seed_patient, seed_prescription, seed_test_request, seed_user,
};

struct Ward {
    orchestrator: BillingOrchestrator,
    finalizer: PaymentFinalizer,
    pharmacist: UserId,
    patient: PatientId,
}

impl Ward {
    async fn open(pool: &PgPool) -> Self {
        let pharmacist = seed_user(pool, "pharmacy").await.unwrap();
        let (_, patient) = seed_patient(pool).await.unwrap();
        Self {
            orchestrator: BillingOrchestrator::new(pool.clone()),
            finalizer: PaymentFinalizer::new(pool.clone()),
            pharmacist,
            patient,
        }
    }

    fn dispense(&self, prescription: PrescriptionId, medicine: MedicineId, quantity: i32) -> DispenseCommand {
        DispenseCommand {
            prescription_id: prescription,
            medicine_id: medicine,
            quantity,
            bill_amount: None,
            description: None,
            due_date: None,
            dispensed_by: self.pharmacist,
        }
    }

    fn lab(&self, test: TestRequestId, amount: Decimal) -> LabBillingCommand {
        LabBillingCommand {
            target: LabBillingTarget::TestRequest(test),
            amount,
            description: None,
            due_date: None,
        }
    }

    fn pay(&self, invoice: InvoiceId) -> PaymentCommand {
        PaymentCommand {
            invoice_id: invoice,
            scope: PayerScope::Patient(self.patient),
            payment_method: None,
            amount: None,
        }
    }
}

// ============================================================================
// End-to-end scenario
// ============================================================================

db_test!(test_dispense_lab_pay_scenario, |pool| {
    let ward = Ward::open(&pool).await;
    let amoxicillin = seed_medicine(&pool, "Amoxicillin", 50, Some(dec!(2.00))).await.unwrap();
    let rx = seed_prescription(&pool, ward.patient, &[(amoxicillin, 10)]).await.unwrap();

    let dispensed = ward.orchestrator.dispense(ward.dispense(rx, amoxicillin, 10)).await.unwrap();
    assert_eq!(dispensed.remaining_stock, 40);
    assert_eq!(dispensed.charge_amount.amount(), dec!(20.00));
    assert_eq!(dispensed.invoice_action.action, InvoiceActionType::Created);
    assert_eq!(dispensed.invoice_action.updated_total.amount(), dec!(20.00));
    assert_eq!(dispensed.record.quantity_dispensed, 10);
    assert_eq!(medicine_quantity(&pool, amoxicillin).await.unwrap(), 40);
    assert_eq!(dispensing_count(&pool, rx).await.unwrap(), 1);

    let cbc = seed_test_request(&pool, ward.patient, "CBC", "completed").await.unwrap();
    let billed = ward.orchestrator.bill_lab(ward.lab(cbc, dec!(15.00))).await.unwrap();
    assert_eq!(billed.invoice_action.action, InvoiceActionType::Updated);
    assert_eq!(billed.invoice_action.invoice_id, dispensed.invoice_action.invoice_id);
    assert_eq!(billed.invoice_action.amount_appended.amount(), dec!(15.00));
    assert_eq!(billed.invoice_action.updated_total.amount(), dec!(35.00));
    assert_eq!(billed.test.billing_amount.amount(), dec!(15.00));
    assert_eq!(billed.test.billing_invoice_id, Some(billed.invoice_action.invoice_id));
    assert!(billed.test.billed_at.is_some());

    let invoice_id = billed.invoice_action.invoice_id;
    let invoice = InvoiceRepository::new(pool.clone()).get_by_id(invoice_id).await.unwrap();
    assert_eq!(
        invoice.charge_lines().collect::<Vec<_>>(),
        vec!["Pharmacy charge: Amoxicillin x10", "Lab charge: CBC"]
    );

    let paid = ward.finalizer.pay(ward.pay(invoice_id)).await.unwrap();
    assert_eq!(paid.invoice.status, InvoiceStatus::Paid);
    assert_eq!(paid.payment.amount_paid.amount(), dec!(35.00));
    assert_eq!(paid.payment.payment_method.as_str(), "cash");

    let again = ward.finalizer.pay(ward.pay(invoice_id)).await.unwrap_err();
    assert!(matches!(again, LedgerError::Billing(BillingError::AlreadyPaid(_))));
    assert_eq!(payment_count(&pool, invoice_id).await.unwrap(), 1);
});

db_test!(test_charge_after_payment_opens_new_invoice, |pool| {
    let ward = Ward::open(&pool).await;
    let first = seed_test_request(&pool, ward.patient, "CBC", "completed").await.unwrap();
    let second = seed_test_request(&pool, ward.patient, "Lipid panel", "completed").await.unwrap();

    let billed = ward.orchestrator.bill_lab(ward.lab(first, dec!(15))).await.unwrap();
    ward.finalizer.pay(ward.pay(billed.invoice_action.invoice_id)).await.unwrap();

    let next = ward.orchestrator.bill_lab(ward.lab(second, dec!(40))).await.unwrap();
    assert_eq!(next.invoice_action.action, InvoiceActionType::Created);
    assert_ne!(next.invoice_action.invoice_id, billed.invoice_action.invoice_id);
    assert_eq!(invoice_count(&pool, ward.patient).await.unwrap(), 2);
});

// ============================================================================
// Inventory guard
// ============================================================================

db_test!(test_insufficient_stock_leaves_everything_untouched, |pool| {
    let ward = Ward::open(&pool).await;
    let medicine = seed_medicine(&pool, "Ibuprofen", 5, Some(dec!(1.00))).await.unwrap();
    let rx = seed_prescription(&pool, ward.patient, &[(medicine, 6)]).await.unwrap();

    let err = ward.orchestrator.dispense(ward.dispense(rx, medicine, 6)).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Billing(BillingError::InsufficientStock { available: 5, requested: 6, .. })
    ));
    assert_eq!(medicine_quantity(&pool, medicine).await.unwrap(), 5);
    assert_eq!(dispensing_count(&pool, rx).await.unwrap(), 0);
    assert_eq!(invoice_count(&pool, ward.patient).await.unwrap(), 0);
});

db_test!(test_unpriced_medicine_needs_bill_amount, |pool| {
    let ward = Ward::open(&pool).await;
    let medicine = seed_medicine(&pool, "Compounded cream", 3, None).await.unwrap();
    let rx = seed_prescription(&pool, ward.patient, &[(medicine, 1)]).await.unwrap();

    let err = ward.orchestrator.dispense(ward.dispense(rx, medicine, 1)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Billing(BillingError::MissingUnitPrice(_))));
    assert_eq!(medicine_quantity(&pool, medicine).await.unwrap(), 3);

    let mut command = ward.dispense(rx, medicine, 1);
    command.bill_amount = Some(dec!(12.345));
    let outcome = ward.orchestrator.dispense(command).await.unwrap();
    assert_eq!(outcome.charge_amount.amount(), dec!(12.35));
    assert_eq!(outcome.remaining_stock, 2);
});

db_test!(test_amounts_beyond_ledger_range_are_rejected, |pool| {
    let ward = Ward::open(&pool).await;
    let medicine = seed_medicine(&pool, "Biologic", 4, Some(dec!(100.00))).await.unwrap();
    let rx = seed_prescription(&pool, ward.patient, &[(medicine, 1)]).await.unwrap();

    let mut command = ward.dispense(rx, medicine, 1);
    command.bill_amount = Some(dec!(10000000000));
    let err = ward.orchestrator.dispense(command).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert_eq!(medicine_quantity(&pool, medicine).await.unwrap(), 4);
    assert_eq!(invoice_count(&pool, ward.patient).await.unwrap(), 0);

    let mri = seed_test_request(&pool, ward.patient, "MRI", "completed").await.unwrap();
    let opened = ward.orchestrator.bill_lab(ward.lab(mri, dec!(9999999990.00))).await.unwrap();

    let err = ward.orchestrator.dispense(ward.dispense(rx, medicine, 1)).await.unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::Validation));
    assert_eq!(medicine_quantity(&pool, medicine).await.unwrap(), 4);
    assert_eq!(dispensing_count(&pool, rx).await.unwrap(), 0);

    let invoice = InvoiceRepository::new(pool.clone())
        .get_by_id(opened.invoice_action.invoice_id)
        .await
        .unwrap();
    assert_eq!(invoice.amount.amount(), dec!(9999999990.00));
});

db_test!(test_unknown_prescription_is_not_found, |pool| {
    let ward = Ward::open(&pool).await;
    let medicine = seed_medicine(&pool, "Paracetamol", 20, Some(dec!(0.50))).await.unwrap();

    let err = ward
        .orchestrator
        .dispense(ward.dispense(PrescriptionId::new(), medicine, 2))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Billing(BillingError::NotFound { entity: "Prescription", .. })
    ));
    assert_eq!(medicine_quantity(&pool, medicine).await.unwrap(), 20);
});

db_test!(test_concurrent_dispenses_never_oversell, |pool| {
    let ward = Ward::open(&pool).await;
    let medicine = seed_medicine(&pool, "Insulin", 10, Some(dec!(8.00))).await.unwrap();
    let rx = seed_prescription(&pool, ward.patient, &[(medicine, 12)]).await.unwrap();

    let (a, b) = tokio::join!(
        ward.orchestrator.dispense(ward.dispense(rx, medicine, 6)),
        ward.orchestrator.dispense(ward.dispense(rx, medicine, 6)),
    );

    let succeeded = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(succeeded, 1);
    let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(failure, LedgerError::Billing(BillingError::InsufficientStock { .. })));

    assert_eq!(medicine_quantity(&pool, medicine).await.unwrap(), 4);
    assert_eq!(dispensing_count(&pool, rx).await.unwrap(), 1);
    assert_eq!(invoice_count(&pool, ward.patient).await.unwrap(), 1);

    let history = DispensingRepository::new(pool.clone()).find_by_prescription(rx).await.unwrap();
    assert_eq!(history.len(), 1);
    let items = PrescriptionRepository::new(pool.clone()).items(rx).await.unwrap();
    assert_eq!(items[0].quantity, 12);
});

// ============================================================================
// Invoice accumulator
// ============================================================================

db_test!(test_concurrent_first_charges_share_one_invoice, |pool| {
    let ward = Ward::open(&pool).await;
    let cbc = seed_test_request(&pool, ward.patient, "CBC", "completed").await.unwrap();
    let xray = seed_test_request(&pool, ward.patient, "Chest X-ray", "completed").await.unwrap();

    let (a, b) = tokio::join!(
        ward.orchestrator.bill_lab(ward.lab(cbc, dec!(15.00))),
        ward.orchestrator.bill_lab(ward.lab(xray, dec!(60.00))),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.invoice_action.invoice_id, b.invoice_action.invoice_id);
    let mut actions = vec![a.invoice_action.action, b.invoice_action.action];
    actions.sort_by_key(|action| *action == InvoiceActionType::Updated);
    assert_eq!(actions, vec![InvoiceActionType::Created, InvoiceActionType::Updated]);

    let invoices = InvoiceRepository::new(pool.clone()).find_by_patient(ward.patient).await.unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].amount.amount(), dec!(75.00));
    assert_eq!(invoices[0].charge_lines().count(), 2);
});

db_test!(test_non_completed_lab_work_is_not_billed, |pool| {
    let ward = Ward::open(&pool).await;
    let pending = seed_test_request(&pool, ward.patient, "CBC", "pending").await.unwrap();

    let err = ward.orchestrator.bill_lab(ward.lab(pending, dec!(15))).await.unwrap_err();
    assert!(matches!(err, LedgerError::Billing(BillingError::NotBillable { .. })));
    assert_eq!(invoice_count(&pool, ward.patient).await.unwrap(), 0);
});

db_test!(test_lab_report_billing_uses_report_type, |pool| {
    let ward = Ward::open(&pool).await;
    let report = seed_lab_report(&pool, ward.patient, "MRI review", "completed").await.unwrap();

    let outcome = ward
        .orchestrator
        .bill_lab(LabBillingCommand {
            target: LabBillingTarget::LabReport(report),
            amount: dec!(120),
            description: None,
            due_date: Some("2030-01-31".to_string()),
        })
        .await
        .unwrap();

    let invoice = InvoiceRepository::new(pool.clone())
        .get_by_id(outcome.invoice_action.invoice_id)
        .await
        .unwrap();
    assert_eq!(invoice.description.as_deref(), Some("Lab charge: MRI review"));
    assert_eq!(invoice.due_date.map(|d| d.to_string()), Some("2030-01-31".to_string()));
});

db_test!(test_amend_appends_to_pending_and_rejects_paid, |pool| {
    let ward = Ward::open(&pool).await;
    let cbc = seed_test_request(&pool, ward.patient, "CBC", "completed").await.unwrap();
    let billed = ward.orchestrator.bill_lab(ward.lab(cbc, dec!(15))).await.unwrap();
    let invoice_id = billed.invoice_action.invoice_id;

    let amended = ward
        .orchestrator
        .amend_invoice(AmendInvoiceCommand {
            invoice_id,
            amount: dec!(5.5),
            description: Some("  ".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(amended.invoice_action.action, InvoiceActionType::Updated);
    assert_eq!(amended.invoice.amount.amount(), dec!(20.50));
    assert_eq!(amended.invoice.description.as_deref(), Some("Lab charge: CBC\nAdditional charge"));

    ward.finalizer.pay(ward.pay(invoice_id)).await.unwrap();
    let err = ward
        .orchestrator
        .amend_invoice(AmendInvoiceCommand {
            invoice_id,
            amount: dec!(1),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Billing(BillingError::InvoiceNotPending { .. })));
});

// ============================================================================
// Payment finalizer
// ============================================================================

db_test!(test_concurrent_payments_settle_once, |pool| {
    let ward = Ward::open(&pool).await;
    let cbc = seed_test_request(&pool, ward.patient, "CBC", "completed").await.unwrap();
    let invoice_id = ward.orchestrator.bill_lab(ward.lab(cbc, dec!(15))).await.unwrap().invoice_action.invoice_id;

    let (a, b) = tokio::join!(
        ward.finalizer.pay(ward.pay(invoice_id)),
        ward.finalizer.pay(ward.pay(invoice_id)),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(payment_count(&pool, invoice_id).await.unwrap(), 1);
});

db_test!(test_patient_cannot_pay_foreign_invoice, |pool| {
    let ward = Ward::open(&pool).await;
    let (_, stranger) = seed_patient(&pool).await.unwrap();
    let cbc = seed_test_request(&pool, ward.patient, "CBC", "completed").await.unwrap();
    let invoice_id = ward.orchestrator.bill_lab(ward.lab(cbc, dec!(15))).await.unwrap().invoice_action.invoice_id;

    let err = ward
        .finalizer
        .pay(PaymentCommand {
            scope: PayerScope::Patient(stranger),
            ..ward.pay(invoice_id)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Billing(BillingError::NotFound { entity: "Invoice", .. })));
    assert_eq!(payment_count(&pool, invoice_id).await.unwrap(), 0);

    let staff = ward
        .finalizer
        .pay(PaymentCommand {
            scope: PayerScope::Staff,
            payment_method: Some("Credit Card".to_string()),
            amount: Some(dec!(10)),
            ..ward.pay(invoice_id)
        })
        .await
        .unwrap();
    assert_eq!(staff.payment.payment_method.as_str(), "credit_card");
    assert_eq!(staff.payment.amount_paid.amount(), dec!(10.00));
    assert_eq!(staff.invoice.status, InvoiceStatus::Paid);
});
