//! Year-end carryover processing.
//!
//! The batch job that closes one fiscal year: it expires buckets whose
//! 2-fiscal-year window has ended, caps the closing year's remainder
//! against the statutory limit, and records every day lost as an
//! explicit `Expiration` audit entry. Days are never lost anywhere
//! else, and never silently.
//!
//! The run is idempotent: a marker audit entry records each completed
//! `(from_year, to_year)` pair, and a second invocation is rejected
//! with `AlreadyProcessed` before any employee is touched. Within a
//! run, employees already carrying a `Carryover` entry for the pair are
//! skipped, so an interrupted run can be resumed without
//! double-crediting anyone.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{calculate_grant, plan_carryover};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AuditAction, AuditEntry};
use crate::notifications::ComplianceEvent;

use super::Ledger;
use super::store::Transaction;

/// Reserved employee id under which run markers are logged.
const CARRYOVER_MARKER_ID: &str = "system:carryover";

/// One employee the year-end run could not process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryoverFailure {
    /// The employee whose processing failed.
    pub employee_id: String,
    /// The error, rendered for the summary.
    pub error: String,
}

/// The outcome of one year-end run.
#[derive(Debug)]
pub struct CarryoverSummary {
    /// The fiscal year that was closed.
    pub from_year: i32,
    /// The fiscal year that was opened.
    pub to_year: i32,
    /// Employees processed successfully.
    pub processed: usize,
    /// Total days carried across all employees.
    pub carried_total: Decimal,
    /// Total days permanently expired across all employees.
    pub expired_total: Decimal,
    /// Employees whose processing failed; the rest of the run was not
    /// affected.
    pub failures: Vec<CarryoverFailure>,
}

impl Ledger {
    /// Runs year-end processing for every employee holding buckets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` unless `to_year == from_year + 1`, and
    /// `AlreadyProcessed` if the pair has already been closed. Failures
    /// of individual employees are collected in the summary, never
    /// raised.
    pub fn process_year_end(
        &self,
        from_year: i32,
        to_year: i32,
        actor: &str,
    ) -> LedgerResult<CarryoverSummary> {
        if to_year != from_year + 1 {
            return Err(LedgerError::InvalidInput {
                field: "to_year".to_string(),
                message: format!("expected {}, got {}", from_year + 1, to_year),
            });
        }

        let marker_reason = format!("year-end {} -> {}", from_year, to_year);
        let already_run = self.store.audit_for_employee(CARRYOVER_MARKER_ID).iter().any(|e| {
            e.action == AuditAction::Carryover && e.reason == marker_reason
        });
        if already_run {
            return Err(LedgerError::AlreadyProcessed { from_year, to_year });
        }

        let mut summary = CarryoverSummary {
            from_year,
            to_year,
            processed: 0,
            carried_total: Decimal::ZERO,
            expired_total: Decimal::ZERO,
            failures: Vec::new(),
        };

        for employee_id in self.store.employee_ids_with_buckets() {
            match self.carry_over_employee(&employee_id, from_year, to_year, actor) {
                Ok(Some((carried, expired))) => {
                    summary.processed += 1;
                    summary.carried_total += carried;
                    summary.expired_total += expired;
                }
                Ok(None) => {
                    // Already carried for this pair by an interrupted run
                }
                Err(error) => {
                    warn!(
                        employee_id = employee_id.as_str(),
                        error = %error,
                        "year-end processing failed for employee"
                    );
                    summary.failures.push(CarryoverFailure {
                        employee_id,
                        error: error.to_string(),
                    });
                }
            }
        }

        let mut marker = Transaction::new(CARRYOVER_MARKER_ID);
        marker.append_audit(AuditEntry {
            id: Uuid::new_v4(),
            action: AuditAction::Carryover,
            employee_id: CARRYOVER_MARKER_ID.to_string(),
            affected_year: from_year,
            amount: summary.carried_total,
            balance_before: Decimal::ZERO,
            balance_after: Decimal::ZERO,
            actor: actor.to_string(),
            reason: marker_reason,
            timestamp: Utc::now(),
        });
        self.store.commit(marker)?;

        info!(
            from_year = from_year,
            to_year = to_year,
            processed = summary.processed,
            carried = %summary.carried_total,
            expired = %summary.expired_total,
            failures = summary.failures.len(),
            "year-end carryover finished"
        );
        Ok(summary)
    }

    /// Processes one employee's boundary. Returns `Ok(None)` when the
    /// employee was already carried for this pair.
    fn carry_over_employee(
        &self,
        employee_id: &str,
        from_year: i32,
        to_year: i32,
        actor: &str,
    ) -> LedgerResult<Option<(Decimal, Decimal)>> {
        let _lock = self.locks.acquire(employee_id)?;
        self.ensure_writable(employee_id)?;

        let already_carried = self
            .store
            .audit_for_year(employee_id, from_year)
            .iter()
            .any(|e| e.action == AuditAction::Carryover);
        if already_carried {
            return Ok(None);
        }

        let mut buckets = self.load_checked_buckets(employee_id)?;
        let incoming_grant = self.incoming_grant(employee_id, to_year);
        let cap = self.policy.balances().carryover_cap_days;
        let plan = plan_carryover(&buckets, from_year, to_year, incoming_grant, cap);

        let mut txn = Transaction::new(employee_id);
        let mut expired_total = Decimal::ZERO;

        for expiration in &plan.expirations {
            let bucket = buckets
                .iter_mut()
                .find(|b| b.origin_year == expiration.origin_year)
                .ok_or_else(|| LedgerError::DataIntegrityViolation {
                    employee_id: employee_id.to_string(),
                    message: format!("planned bucket {} vanished", expiration.origin_year),
                })?;

            let balance_after = if expiration.origin_year == from_year {
                // Cap excess: the bucket stays active with the capped
                // remainder; only the excess is lost.
                plan.carried_days
            } else {
                bucket.expired = true;
                Decimal::ZERO
            };
            bucket.remaining_days = balance_after;
            txn.write_bucket(bucket.clone());

            if expiration.expired_amount > Decimal::ZERO {
                expired_total += expiration.expired_amount;
                txn.append_audit(AuditEntry {
                    id: Uuid::new_v4(),
                    action: AuditAction::Expiration,
                    employee_id: employee_id.to_string(),
                    affected_year: expiration.origin_year,
                    amount: expiration.expired_amount,
                    balance_before: expiration.remaining_before,
                    balance_after,
                    actor: actor.to_string(),
                    reason: if expiration.origin_year == from_year {
                        format!(
                            "year-end {} -> {}: {} days over the {}-day cap",
                            from_year, to_year, expiration.expired_amount, cap
                        )
                    } else {
                        format!(
                            "year-end {} -> {}: bucket {} window closed",
                            from_year, to_year, expiration.origin_year
                        )
                    },
                    timestamp: Utc::now(),
                });
            }
        }

        let has_from_bucket = buckets
            .iter()
            .any(|b| b.origin_year == from_year && !b.expired);
        if has_from_bucket {
            txn.append_audit(AuditEntry {
                id: Uuid::new_v4(),
                action: AuditAction::Carryover,
                employee_id: employee_id.to_string(),
                affected_year: from_year,
                amount: plan.carried_days,
                balance_before: plan.from_remaining_before,
                balance_after: plan.carried_days,
                actor: actor.to_string(),
                reason: format!(
                    "year-end {} -> {}: carried {} of {}",
                    from_year, to_year, plan.carried_days, plan.from_remaining_before
                ),
                timestamp: Utc::now(),
            });
        }

        txn.verify_cap(cap, to_year);
        self.store.commit(txn)?;

        if expired_total > Decimal::ZERO {
            self.sink.notify(ComplianceEvent::DaysExpired {
                employee_id: employee_id.to_string(),
                amount: expired_total,
            });
        }

        Ok(Some((plan.carried_days, expired_total)))
    }

    /// The `to_year` entitlement counted against the cap: the grant
    /// already issued, or the entitlement about to be issued per the
    /// schedule when the grant has not been materialized yet.
    fn incoming_grant(&self, employee_id: &str, to_year: i32) -> Decimal {
        if let Some(grant) = self.store.grant(employee_id, to_year) {
            return grant.granted_days;
        }
        match self.directory.hire_date(employee_id) {
            Some(hire_date) => {
                let reference = self.policy.fiscal().year_start(to_year);
                calculate_grant(hire_date, reference, self.policy.grant_table()).granted_days
            }
            None => Decimal::ZERO,
        }
    }
}
