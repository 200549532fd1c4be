//! The effectful side of the leave balance ledger.
//!
//! [`Ledger`] ties the transactional store, the per-employee lock
//! table, the policy, and the external boundaries together. Every
//! mutating operation follows the same shape: acquire the employee's
//! lock, check the employee is writable, plan the change with a pure
//! function from [`crate::calculation`], stage the writes and their
//! audit entries in one [`Transaction`], and commit atomically.

mod carryover;
mod deduction;
mod designation;
mod grants;
mod locks;
mod store;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::config::LeavePolicy;
use crate::directory::EmployeeDirectory;
use crate::error::{LedgerError, LedgerResult};
use crate::models::EmployeeProfile;
use crate::notifications::{NotificationSink, NullSink};

pub use carryover::{CarryoverFailure, CarryoverSummary};
pub use deduction::{DeductionResult, RevertResult};
pub use designation::{ComplianceSweepSummary, DesignationResult};
pub use grants::{GrantBatchSummary, SkippedGrant};
pub use locks::{EmployeeLockGuard, EmployeeLocks};
pub use store::{LedgerStore, Transaction};

/// The fiscal-year leave balance ledger.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use leave_ledger::config::PolicyLoader;
/// use leave_ledger::directory::InMemoryDirectory;
/// use leave_ledger::ledger::Ledger;
///
/// let policy = PolicyLoader::load("./config/art39").unwrap().into_policy();
/// let directory = Arc::new(InMemoryDirectory::new());
/// let ledger = Ledger::new(policy, directory);
/// ```
pub struct Ledger {
    policy: LeavePolicy,
    store: LedgerStore,
    locks: EmployeeLocks,
    directory: Arc<dyn EmployeeDirectory>,
    sink: Arc<dyn NotificationSink>,
}

impl Ledger {
    /// Creates a ledger with no notification delivery wired up.
    pub fn new(policy: LeavePolicy, directory: Arc<dyn EmployeeDirectory>) -> Self {
        let timeout = Duration::from_millis(policy.locking().timeout_ms);
        Self {
            policy,
            store: LedgerStore::new(),
            locks: EmployeeLocks::new(timeout),
            directory,
            sink: Arc::new(NullSink),
        }
    }

    /// Replaces the notification sink.
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the policy the ledger operates under.
    pub fn policy(&self) -> &LeavePolicy {
        &self.policy
    }

    /// Returns read access to the underlying store.
    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Resolves an employee through the directory.
    fn resolve_profile(&self, employee_id: &str) -> LedgerResult<EmployeeProfile> {
        self.directory
            .profile(employee_id)
            .ok_or_else(|| LedgerError::UnknownEmployee {
                employee_id: employee_id.to_string(),
            })
    }

    /// Rejects the operation if writes for the employee are halted.
    fn ensure_writable(&self, employee_id: &str) -> LedgerResult<()> {
        if self.store.is_quarantined(employee_id) {
            return Err(LedgerError::DataIntegrityViolation {
                employee_id: employee_id.to_string(),
                message: "employee is quarantined; writes are halted".to_string(),
            });
        }
        Ok(())
    }

    /// Days used inside one fiscal year, net of reverted records.
    fn used_days(&self, employee_id: &str, year: i32) -> Decimal {
        self.store
            .usage_for(employee_id)
            .iter()
            .filter(|r| !r.reverted && self.policy.fiscal().contains(year, r.use_date))
            .map(|r| r.days_deducted)
            .sum()
    }
}
