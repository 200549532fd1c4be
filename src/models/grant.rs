//! Fiscal-year grant records.
//!
//! A [`FiscalYearGrant`] is created once per employee per fiscal year by
//! the grant schedule calculator and is immutable after creation.
//! Corrections are expressed as new audit entries, never as edits to the
//! grant row.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The entitlement granted to one employee for one fiscal year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearGrant {
    /// The employee the grant belongs to.
    pub employee_id: String,
    /// The fiscal year the entitlement applies to.
    pub grant_year: i32,
    /// The number of days granted (non-negative, one decimal place).
    pub granted_days: Decimal,
    /// The date the grant was issued.
    pub grant_date: NaiveDate,
    /// True when the hire date was invalid (future or implausibly old)
    /// and the grant was recorded as zero for upstream review.
    #[serde(default)]
    pub invalid_hire_date: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_serialize_grant_round_trip() {
        let grant = FiscalYearGrant {
            employee_id: "emp_001".to_string(),
            grant_year: 2025,
            granted_days: dec("10.0"),
            grant_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            invalid_hire_date: false,
        };

        let json = serde_json::to_string(&grant).unwrap();
        let deserialized: FiscalYearGrant = serde_json::from_str(&json).unwrap();
        assert_eq!(grant, deserialized);
    }

    #[test]
    fn test_deserialize_grant_without_invalid_flag() {
        let json = r#"{
            "employee_id": "emp_001",
            "grant_year": 2025,
            "granted_days": "10.0",
            "grant_date": "2025-04-01"
        }"#;

        let grant: FiscalYearGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.granted_days, dec("10.0"));
        assert!(!grant.invalid_hire_date);
    }

    #[test]
    fn test_granted_days_serialized_as_string() {
        let grant = FiscalYearGrant {
            employee_id: "emp_001".to_string(),
            grant_year: 2025,
            granted_days: dec("20.0"),
            grant_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            invalid_hire_date: false,
        };

        let json = serde_json::to_string(&grant).unwrap();
        assert!(json.contains("\"granted_days\":\"20.0\""));
    }
}
