//! Employee directory boundary.
//!
//! The employee entity is owned by an external directory service; the
//! ledger consumes it read-only through the [`EmployeeDirectory`] trait
//! and never caches a profile beyond a single operation. An in-memory
//! implementation ships for tests and for embedding the ledger without
//! a real directory.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::NaiveDate;

use crate::models::{EmployeeProfile, EmploymentStatus};

/// Read-only access to the employee attributes the ledger consumes.
pub trait EmployeeDirectory: Send + Sync {
    /// Returns the profile for an employee, or `None` if the id does
    /// not resolve.
    fn profile(&self, employee_id: &str) -> Option<EmployeeProfile>;

    /// Returns the hire date for an employee.
    fn hire_date(&self, employee_id: &str) -> Option<NaiveDate> {
        self.profile(employee_id).map(|p| p.hire_date)
    }

    /// Returns the employment status for an employee.
    fn status(&self, employee_id: &str) -> Option<EmploymentStatus> {
        self.profile(employee_id).map(|p| p.status)
    }
}

/// An in-memory employee directory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    profiles: RwLock<HashMap<String, EmployeeProfile>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a profile.
    pub fn insert(&self, profile: EmployeeProfile) {
        self.profiles
            .write()
            .expect("directory lock poisoned")
            .insert(profile.employee_id.clone(), profile);
    }

    /// Convenience constructor for an active employee.
    pub fn insert_active(&self, employee_id: &str, hire_date: NaiveDate) {
        self.insert(EmployeeProfile {
            employee_id: employee_id.to_string(),
            hire_date,
            status: EmploymentStatus::Active,
        });
    }
}

impl EmployeeDirectory for InMemoryDirectory {
    fn profile(&self, employee_id: &str) -> Option<EmployeeProfile> {
        self.profiles
            .read()
            .expect("directory lock poisoned")
            .get(employee_id)
            .cloned()
    }
}
