//! Charge lines
//!
//! A charge line is one description segment plus one amount delta. It is not
//! stored on its own: it is appended to an invoice's newline-delimited
//! `description` while its amount is added to the invoice total, both in the
//! same write.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::error::{BillingError, BillingResult};

/// Line used for manual amendments that arrive without a description
pub const DEFAULT_AMENDMENT_LINE: &str = "Additional charge";

/// A validated charge: positive amount and non-empty description line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeLine {
    amount: Money,
    description: String,
}

impl ChargeLine {
    /// Builds a charge from a raw amount and an optional caller-supplied line
    ///
    /// The amount is rounded to two places and must stay positive. A blank
    /// or missing line is replaced by `default_line`.
    pub fn new(
        amount: Decimal,
        description: Option<&str>,
        default_line: impl Into<String>,
    ) -> BillingResult<Self> {
        let amount = Money::positive(amount)?;
        let description = match description.map(str::trim) {
            Some(line) if !line.is_empty() => line.to_string(),
            _ => default_line.into(),
        };
        Ok(Self {
            amount,
            description,
        })
    }

    /// Builds a charge from an already-computed amount
    pub fn from_money(amount: Money, description: Option<&str>, default_line: impl Into<String>) -> BillingResult<Self> {
        Self::new(amount.amount(), description, default_line)
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Default line for a lab charge
pub fn lab_charge_line(test_type: &str) -> String {
    format!("Lab charge: {}", test_type)
}

/// Default line for a pharmacy charge
pub fn pharmacy_charge_line(medicine_name: &str, quantity: i32) -> String {
    format!("Pharmacy charge: {} x{}", medicine_name, quantity)
}

/// Appends a charge line to an existing invoice description
///
/// The result is `existing + "\n" + line`, trimmed, so an empty or missing
/// description yields just the new line.
pub fn append_line(existing: Option<&str>, line: &str) -> String {
    let joined = match existing {
        Some(current) if !current.trim().is_empty() => format!("{}\n{}", current, line),
        _ => line.to_string(),
    };
    joined.trim().to_string()
}

/// Parses an optional due date in strict `YYYY-MM-DD` form
///
/// Blank input is treated as absent.
pub fn parse_due_date(raw: Option<&str>) -> BillingResult<Option<NaiveDate>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let well_formed = raw.len() == 10
        && raw
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(BillingError::InvalidDueDate(raw.to_string()));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| BillingError::InvalidDueDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use core_kernel::MoneyError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_description_uses_default() {
        let charge = ChargeLine::new(dec!(15), Some("   "), lab_charge_line("CBC")).unwrap();
        assert_eq!(charge.description(), "Lab charge: CBC");

        let charge = ChargeLine::new(dec!(15), None, DEFAULT_AMENDMENT_LINE).unwrap();
        assert_eq!(charge.description(), "Additional charge");
    }

    #[test]
    fn test_amount_is_rounded_not_rejected() {
        let charge = ChargeLine::new(dec!(10.006), Some("X-ray"), "unused").unwrap();
        assert_eq!(charge.amount().amount(), dec!(10.01));
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        assert!(matches!(
            ChargeLine::new(dec!(0), Some("free"), "x"),
            Err(BillingError::InvalidAmount(_))
        ));
        assert!(ChargeLine::new(dec!(-5), Some("refund"), "x").is_err());
    }

    #[test]
    fn test_amount_above_ledger_maximum_rejected() {
        let err = ChargeLine::new(dec!(10000000000), Some("X"), "x").unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount(MoneyError::OutOfRange(_))));
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert!(ChargeLine::new(dec!(9999999999.99), Some("X"), "x").is_ok());
    }

    #[test]
    fn test_append_line() {
        assert_eq!(append_line(None, "a"), "a");
        assert_eq!(append_line(Some(""), "a"), "a");
        assert_eq!(append_line(Some("a"), "b"), "a\nb");
        assert_eq!(append_line(Some("  a\n"), "b "), "a\n\nb");
    }

    #[test]
    fn test_parse_due_date() {
        assert_eq!(parse_due_date(None).unwrap(), None);
        assert_eq!(parse_due_date(Some("")).unwrap(), None);
        assert_eq!(
            parse_due_date(Some("2026-11-30")).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 30)
        );
        assert!(parse_due_date(Some("2026-2-3")).is_err());
        assert!(parse_due_date(Some("2026-02-30")).is_err());
        assert!(parse_due_date(Some("30/11/2026")).is_err());
    }
}
