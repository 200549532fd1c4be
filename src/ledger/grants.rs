//! Grant issuing.
//!
//! Materializes the grant schedule calculation as a [`FiscalYearGrant`]
//! row and its balance bucket, with a `Grant` audit entry in the same
//! transaction. The batch run covers a whole workforce and never lets
//! one employee's bad data abort the rest.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{HireDateValidity, calculate_grant};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AuditAction, AuditEntry, EmploymentStatus, FiscalYearGrant, LeaveBalanceBucket,
};

use super::Ledger;
use super::store::Transaction;

/// An employee the batch run did not issue a grant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedGrant {
    /// The employee in question.
    pub employee_id: String,
    /// Why no grant was issued.
    pub reason: String,
}

/// The outcome of one batch grant run.
#[derive(Debug)]
pub struct GrantBatchSummary {
    /// The fiscal year the run granted for.
    pub year: i32,
    /// Grants issued, including zero-day grants flagged for an invalid
    /// hire date.
    pub granted: Vec<FiscalYearGrant>,
    /// Employees skipped (terminated, or already granted this year).
    pub skipped: Vec<SkippedGrant>,
    /// Employees whose grant failed outright.
    pub failures: Vec<SkippedGrant>,
}

impl GrantBatchSummary {
    /// Grants recorded with a zero entitlement because the hire date
    /// was invalid; these need upstream review.
    pub fn flagged(&self) -> Vec<&FiscalYearGrant> {
        self.granted.iter().filter(|g| g.invalid_hire_date).collect()
    }
}

impl Ledger {
    /// Issues the fiscal-year grant for one employee.
    ///
    /// Seniority is measured from the directory's hire date to
    /// `grant_date`. An invalid hire date (future, or implausibly old)
    /// records a zero-day grant flagged for review instead of failing,
    /// so batch runs keep going.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEmployee` if the directory cannot resolve the
    /// id, `AlreadyGranted` if a grant exists for the employee-year,
    /// and `Busy` if the employee's lock cannot be acquired in time.
    pub fn issue_grant(
        &self,
        employee_id: &str,
        year: i32,
        grant_date: NaiveDate,
        actor: &str,
    ) -> LedgerResult<FiscalYearGrant> {
        let _lock = self.locks.acquire(employee_id)?;
        self.ensure_writable(employee_id)?;
        let profile = self.resolve_profile(employee_id)?;

        if self.store.grant(employee_id, year).is_some() {
            return Err(LedgerError::AlreadyGranted {
                employee_id: employee_id.to_string(),
                year,
            });
        }

        let calc = calculate_grant(profile.hire_date, grant_date, self.policy.grant_table());
        let grant = FiscalYearGrant {
            employee_id: employee_id.to_string(),
            grant_year: year,
            granted_days: calc.granted_days,
            grant_date,
            invalid_hire_date: !calc.is_valid(),
        };

        let reason = match calc.validity {
            HireDateValidity::Valid => format!(
                "entitlement at {} months of service",
                calc.seniority_months
            ),
            HireDateValidity::FutureHireDate => format!(
                "zero entitlement: hire date {} is after the grant date",
                profile.hire_date
            ),
            HireDateValidity::ImplausiblyOld => format!(
                "zero entitlement: hire date {} is implausibly old",
                profile.hire_date
            ),
        };

        let mut txn = Transaction::new(employee_id);
        txn.write_grant(grant.clone());
        if calc.granted_days > Decimal::ZERO {
            txn.write_bucket(LeaveBalanceBucket::new(employee_id, year, calc.granted_days));
        }
        txn.append_audit(AuditEntry {
            id: Uuid::new_v4(),
            action: AuditAction::Grant,
            employee_id: employee_id.to_string(),
            affected_year: year,
            amount: calc.granted_days,
            balance_before: Decimal::ZERO,
            balance_after: calc.granted_days,
            actor: actor.to_string(),
            reason,
            timestamp: Utc::now(),
        });
        self.store.commit(txn)?;

        info!(
            employee_id = employee_id,
            year = year,
            granted = %grant.granted_days,
            flagged = grant.invalid_hire_date,
            "issued fiscal-year grant"
        );
        Ok(grant)
    }

    /// Runs the grant batch for a fiscal year.
    ///
    /// Terminated employees and employees already granted this year are
    /// skipped; any other failure is collected in the summary rather
    /// than raised, so the run always covers every employee.
    pub fn run_grant_batch(
        &self,
        employee_ids: &[String],
        year: i32,
        grant_date: NaiveDate,
        actor: &str,
    ) -> GrantBatchSummary {
        let mut summary = GrantBatchSummary {
            year,
            granted: Vec::new(),
            skipped: Vec::new(),
            failures: Vec::new(),
        };

        for employee_id in employee_ids {
            if self.directory.status(employee_id) == Some(EmploymentStatus::Terminated) {
                summary.skipped.push(SkippedGrant {
                    employee_id: employee_id.clone(),
                    reason: "terminated".to_string(),
                });
                continue;
            }

            match self.issue_grant(employee_id, year, grant_date, actor) {
                Ok(grant) => summary.granted.push(grant),
                Err(LedgerError::AlreadyGranted { .. }) => {
                    summary.skipped.push(SkippedGrant {
                        employee_id: employee_id.clone(),
                        reason: "already granted".to_string(),
                    });
                }
                Err(error) => {
                    warn!(
                        employee_id = employee_id.as_str(),
                        year = year,
                        error = %error,
                        "grant batch item failed"
                    );
                    summary.failures.push(SkippedGrant {
                        employee_id: employee_id.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        info!(
            year = year,
            granted = summary.granted.len(),
            skipped = summary.skipped.len(),
            failures = summary.failures.len(),
            "grant batch finished"
        );
        summary
    }
}
