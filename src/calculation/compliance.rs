//! Minimum-usage compliance classification.
//!
//! Employees granted at least the obligation threshold (10 days under
//! Art. 39) must use at least the minimum (5 days) within the fiscal
//! year. This module classifies one employee-year from the granted and
//! used totals; it is pure, so calling it twice against unchanged state
//! yields the same answer.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{ComplianceRules, FiscalCalendar};

use super::grant_schedule::seniority_months;

/// Where an employee-year stands against the minimum-usage obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComplianceStatus {
    /// The obligation is met, or does not apply.
    Compliant,
    /// The obligation is unmet and the deadline is near.
    AtRisk,
    /// The deadline has passed with the obligation unmet.
    NonCompliant,
}

/// The full classification of one employee-year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceReport {
    /// The classification.
    pub status: ComplianceStatus,
    /// False when the granted amount is below the obligation threshold,
    /// in which case the status is trivially compliant.
    pub subject_to_obligation: bool,
    /// Days granted for the fiscal year.
    pub granted: Decimal,
    /// Days used within the fiscal year (net of reverts).
    pub used: Decimal,
    /// Days still required to meet the obligation.
    pub shortfall: Decimal,
    /// The last day of the fiscal year.
    pub deadline: NaiveDate,
}

/// Classifies one employee-year against the minimum-usage obligation.
///
/// # Arguments
///
/// * `granted` - Days granted for the fiscal year
/// * `used` - Days used within the fiscal year, net of reverts
/// * `year` - The fiscal year being classified
/// * `today` - The evaluation date
/// * `calendar` - The fiscal calendar
/// * `rules` - The compliance thresholds from the policy
pub fn classify_usage(
    granted: Decimal,
    used: Decimal,
    year: i32,
    today: NaiveDate,
    calendar: &FiscalCalendar,
    rules: &ComplianceRules,
) -> ComplianceReport {
    let deadline = calendar.year_end(year);
    let subject = granted >= rules.obligation_threshold_days;

    if !subject || used >= rules.minimum_usage_days {
        return ComplianceReport {
            status: ComplianceStatus::Compliant,
            subject_to_obligation: subject,
            granted,
            used,
            shortfall: if subject {
                (rules.minimum_usage_days - used).max(Decimal::ZERO)
            } else {
                Decimal::ZERO
            },
            deadline,
        };
    }

    let shortfall = rules.minimum_usage_days - used;

    let status = if today > deadline {
        ComplianceStatus::NonCompliant
    } else {
        // Whole months left before the deadline; inside the window the
        // employee is at risk.
        let months_left = seniority_months(today, deadline).unwrap_or(0);
        if months_left < rules.at_risk_window_months {
            ComplianceStatus::AtRisk
        } else {
            ComplianceStatus::Compliant
        }
    };

    ComplianceReport {
        status,
        subject_to_obligation: true,
        granted,
        used,
        shortfall,
        deadline,
    }
}
