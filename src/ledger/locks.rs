//! Per-employee serialization.
//!
//! Every mutating operation holds its employee's lock for the duration
//! of its transaction. Operations against different employees proceed
//! concurrently; a second operation against the same employee blocks
//! until the lock frees or the bounded timeout elapses, in which case
//! it fails with the retryable [`LedgerError::Busy`].

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::{LedgerError, LedgerResult};

/// Lock table keyed by employee id.
#[derive(Debug)]
pub struct EmployeeLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
    timeout: Duration,
}

impl EmployeeLocks {
    /// Creates a lock table with the given acquisition timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Acquires the lock for one employee, waiting up to the configured
    /// timeout.
    ///
    /// # Returns
    ///
    /// Returns a guard that releases the lock on drop, or
    /// `LedgerError::Busy` if the lock could not be acquired in time.
    pub fn acquire(&self, employee_id: &str) -> LedgerResult<EmployeeLockGuard<'_>> {
        let deadline = Instant::now() + self.timeout;
        let mut held = self.held.lock().expect("employee lock table poisoned");

        while held.contains(employee_id) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(LedgerError::Busy {
                    employee_id: employee_id.to_string(),
                });
            }
            let (guard, wait) = self
                .released
                .wait_timeout(held, remaining)
                .expect("employee lock table poisoned");
            held = guard;
            if wait.timed_out() && held.contains(employee_id) {
                return Err(LedgerError::Busy {
                    employee_id: employee_id.to_string(),
                });
            }
        }

        held.insert(employee_id.to_string());
        Ok(EmployeeLockGuard {
            locks: self,
            employee_id: employee_id.to_string(),
        })
    }
}

/// Holds one employee's lock; released on drop.
#[derive(Debug)]
pub struct EmployeeLockGuard<'a> {
    locks: &'a EmployeeLocks,
    employee_id: String,
}

impl Drop for EmployeeLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .expect("employee lock table poisoned");
        held.remove(&self.employee_id);
        self.locks.released.notify_all();
    }
}
