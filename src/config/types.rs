//! Configuration types for the leave policy.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML policy files.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Metadata about the leave policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyMetadata {
    /// The human-readable name of the policy.
    pub name: String,
    /// Reference to the statutory provision the policy implements.
    pub statute_ref: String,
    /// The version or effective date of the policy.
    pub version: String,
}

/// The fiscal calendar used to map calendar dates to fiscal years.
///
/// A fiscal year is labeled by the calendar year it starts in: with
/// `start_month = 4`, fiscal year 2025 runs from 2025-04-01 through
/// 2026-03-31.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FiscalCalendar {
    /// The calendar month (1-12) the fiscal year starts in.
    pub start_month: u32,
}

impl FiscalCalendar {
    /// Returns the fiscal year the given date falls in.
    pub fn fiscal_year_of(&self, date: NaiveDate) -> i32 {
        if date.month() >= self.start_month {
            date.year()
        } else {
            date.year() - 1
        }
    }

    /// Returns the first day of the given fiscal year.
    ///
    /// `start_month` is validated to 1-12 at policy load.
    pub fn year_start(&self, fiscal_year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(fiscal_year, self.start_month, 1)
            .expect("fiscal start month is a valid calendar month")
    }

    /// Returns the last day of the given fiscal year.
    pub fn year_end(&self, fiscal_year: i32) -> NaiveDate {
        self.year_start(fiscal_year + 1)
            .pred_opt()
            .expect("fiscal year start has a predecessor")
    }

    /// Returns true if the date falls inside the given fiscal year.
    pub fn contains(&self, fiscal_year: i32, date: NaiveDate) -> bool {
        self.fiscal_year_of(date) == fiscal_year
    }
}

/// One row of the seniority step table.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantStep {
    /// Minimum whole months of service for this row to apply.
    pub months_of_service: u32,
    /// Days granted at this seniority.
    pub days: Decimal,
}

/// The seniority-graduated entitlement table from `grant_table.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantTable {
    /// Step rows; sorted ascending by months of service on load.
    pub steps: Vec<GrantStep>,
}

impl GrantTable {
    /// Returns the granted days for the given whole months of service.
    ///
    /// Seniority below the first step yields zero days. Exact boundary
    /// months map to their own row.
    pub fn days_for_months(&self, months_of_service: u32) -> Decimal {
        self.steps
            .iter()
            .rev()
            .find(|step| months_of_service >= step.months_of_service)
            .map(|step| step.days)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Balance limits applied at the fiscal-year boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceRules {
    /// Statutory cap on the sum of active balances immediately after a
    /// carryover operation.
    pub carryover_cap_days: Decimal,
}

/// Thresholds for the minimum-usage compliance obligation.
#[derive(Debug, Clone, Deserialize)]
pub struct ComplianceRules {
    /// An employee granted at least this many days is subject to the
    /// obligation.
    pub obligation_threshold_days: Decimal,
    /// Days that must be used within the fiscal year.
    pub minimum_usage_days: Decimal,
    /// An under-used employee is at risk once fewer than this many
    /// months remain before the fiscal-year deadline.
    pub at_risk_window_months: u32,
    /// Expiring-balance notifications fire within this many days of the
    /// fiscal-year boundary.
    pub expiring_soon_window_days: u32,
}

/// Lock acquisition limits for per-employee serialization.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LockingRules {
    /// Milliseconds to wait for the per-employee lock before failing
    /// with a retryable error.
    pub timeout_ms: u64,
}

/// Top-level structure of `policy.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyFile {
    /// Policy metadata.
    pub policy: PolicyMetadata,
    /// Fiscal calendar settings.
    pub fiscal: FiscalCalendar,
    /// Balance limits.
    pub balances: BalanceRules,
    /// Compliance thresholds.
    pub compliance: ComplianceRules,
    /// Locking limits.
    pub locking: LockingRules,
}

/// The complete leave policy loaded from YAML files.
#[derive(Debug, Clone)]
pub struct LeavePolicy {
    metadata: PolicyMetadata,
    fiscal: FiscalCalendar,
    grant_table: GrantTable,
    balances: BalanceRules,
    compliance: ComplianceRules,
    locking: LockingRules,
}

impl LeavePolicy {
    /// Creates a new LeavePolicy from its component parts.
    pub fn new(policy_file: PolicyFile, grant_table: GrantTable) -> Self {
        let mut sorted_table = grant_table;
        sorted_table
            .steps
            .sort_by_key(|step| step.months_of_service);
        Self {
            metadata: policy_file.policy,
            fiscal: policy_file.fiscal,
            grant_table: sorted_table,
            balances: policy_file.balances,
            compliance: policy_file.compliance,
            locking: policy_file.locking,
        }
    }

    /// Returns the policy metadata.
    pub fn metadata(&self) -> &PolicyMetadata {
        &self.metadata
    }

    /// Returns the fiscal calendar.
    pub fn fiscal(&self) -> &FiscalCalendar {
        &self.fiscal
    }

    /// Returns the seniority step table.
    pub fn grant_table(&self) -> &GrantTable {
        &self.grant_table
    }

    /// Returns the balance limits.
    pub fn balances(&self) -> &BalanceRules {
        &self.balances
    }

    /// Returns the compliance thresholds.
    pub fn compliance(&self) -> &ComplianceRules {
        &self.compliance
    }

    /// Returns the locking limits.
    pub fn locking(&self) -> &LockingRules {
        &self.locking
    }
}
