//! Employee-facing types consumed by the ledger.
//!
//! The employee entity itself is owned by an external directory; the
//! ledger only consumes the hire date and employment status and never
//! mutates them. [`EmployeeProfile`] is the snapshot shape returned by
//! directory implementations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Employment status as reported by the employee directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    /// The employee is currently employed.
    Active,
    /// The employee has left; no new grants are issued, but balance
    /// corrections may still post.
    Terminated,
}

/// A read-only snapshot of the directory attributes the ledger consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeProfile {
    /// Opaque identifier assigned by the external directory.
    pub employee_id: String,
    /// The date the employee was hired.
    pub hire_date: NaiveDate,
    /// Current employment status.
    pub status: EmploymentStatus,
}

impl EmployeeProfile {
    /// Returns true if the employee is currently active.
    pub fn is_active(&self) -> bool {
        self.status == EmploymentStatus::Active
    }
}
