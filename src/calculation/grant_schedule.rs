//! Grant schedule calculation.
//!
//! This module determines the fiscal-year entitlement for an employee
//! from their seniority. It is a pure function over the policy's step
//! table: no side effects, deterministic for a given hire date and
//! reference date.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::config::GrantTable;

/// Hire dates older than this many years are treated as data errors.
pub const MAX_PLAUSIBLE_SENIORITY_YEARS: u32 = 130;

/// Classifies the hire date that went into a grant calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HireDateValidity {
    /// The hire date was usable.
    Valid,
    /// The hire date is after the reference date.
    FutureHireDate,
    /// The hire date is more than 130 years before the reference date.
    ImplausiblyOld,
}

/// The result of a grant schedule calculation.
///
/// Invalid hire dates produce a zero entitlement with the validity flag
/// set, rather than an error, so a batch grant run is never aborted by
/// one bad record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantCalculation {
    /// The number of days to grant.
    pub granted_days: Decimal,
    /// Whole months of service at the reference date (zero when the
    /// hire date was invalid).
    pub seniority_months: u32,
    /// Whether the hire date was usable, and if not, why.
    pub validity: HireDateValidity,
}

impl GrantCalculation {
    /// Returns true if the hire date was usable.
    pub fn is_valid(&self) -> bool {
        self.validity == HireDateValidity::Valid
    }
}

/// Returns the whole months of service between two dates.
///
/// A month is counted only once the day-of-month has been reached, so a
/// hire on 2024-10-01 reaches 6 months on 2025-04-01 and not a day
/// earlier. Returns `None` when `hire_date` is after `reference_date`.
pub fn seniority_months(hire_date: NaiveDate, reference_date: NaiveDate) -> Option<u32> {
    if hire_date > reference_date {
        return None;
    }

    let mut months = (reference_date.year() - hire_date.year()) * 12
        + reference_date.month() as i32
        - hire_date.month() as i32;
    if reference_date.day() < hire_date.day() {
        months -= 1;
    }

    Some(months.max(0) as u32)
}

/// Calculates the fiscal-year entitlement for an employee.
///
/// # Arguments
///
/// * `hire_date` - The employee's hire date from the directory
/// * `reference_date` - The date the grant takes effect
/// * `table` - The seniority step table from the policy
///
/// # Returns
///
/// Returns a [`GrantCalculation`]. A hire date in the future, or more
/// than [`MAX_PLAUSIBLE_SENIORITY_YEARS`] before the reference date,
/// yields zero days with the validity flag set for upstream review.
///
/// # Examples
///
/// ```
/// use leave_ledger::calculation::calculate_grant;
/// use leave_ledger::config::PolicyLoader;
/// use chrono::NaiveDate;
/// ```
pub fn calculate_grant(
    hire_date: NaiveDate,
    reference_date: NaiveDate,
    table: &GrantTable,
) -> GrantCalculation {
    let Some(months) = seniority_months(hire_date, reference_date) else {
        return GrantCalculation {
            granted_days: Decimal::ZERO,
            seniority_months: 0,
            validity: HireDateValidity::FutureHireDate,
        };
    };

    if months > MAX_PLAUSIBLE_SENIORITY_YEARS * 12 {
        return GrantCalculation {
            granted_days: Decimal::ZERO,
            seniority_months: 0,
            validity: HireDateValidity::ImplausiblyOld,
        };
    }

    GrantCalculation {
        granted_days: table.days_for_months(months),
        seniority_months: months,
        validity: HireDateValidity::Valid,
    }
}
