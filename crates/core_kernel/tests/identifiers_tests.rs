//! Unit tests for the typed identifiers

use core_kernel::{InvoiceId, MedicineId, PatientId, PrescriptionId, TestRequestId};
use uuid::Uuid;

#[test]
fn test_new_generates_unique_ids() {
    assert_ne!(InvoiceId::new(), InvoiceId::new());
}

#[test]
fn test_new_v7_generates_time_ordered_ids() {
    let id1 = InvoiceId::new_v7();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let id2 = InvoiceId::new_v7();
    let uuid1: Uuid = id1.into();
    let uuid2: Uuid = id2.into();
    assert!(uuid1 < uuid2);
}

#[test]
fn test_prefixes() {
    assert_eq!(PatientId::prefix(), "PAT");
    assert_eq!(MedicineId::prefix(), "MED");
    assert_eq!(PrescriptionId::prefix(), "RX");
    assert_eq!(TestRequestId::prefix(), "LABT");
}

#[test]
fn test_from_str_with_and_without_prefix() {
    let uuid = Uuid::new_v4();
    let with_prefix: MedicineId = format!("MED-{}", uuid).parse().unwrap();
    let bare: MedicineId = uuid.to_string().parse().unwrap();
    assert_eq!(with_prefix, bare);
    assert_eq!(*bare.as_uuid(), uuid);
}

#[test]
fn test_from_str_rejects_garbage() {
    assert!("INV-not-a-uuid".parse::<InvoiceId>().is_err());
}
