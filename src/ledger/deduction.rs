//! Deduction and revert operations.
//!
//! A deduction spreads an approved leave request across the employee's
//! active buckets, newest grant first, writing one `Deduction` audit
//! entry per affected bucket and a [`UsageRecord`] that makes the
//! operation reversible. Revert restores exactly the recorded amounts
//! to the recorded buckets; if a source bucket has expired since, the
//! amount is credited to the current-year bucket and the audit entry
//! names the substitution.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::plan_deduction;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AuditAction, AuditEntry, BucketAllocation, LeaveBalanceBucket, UsageKind, UsageRecord,
};

use super::Ledger;
use super::store::Transaction;

/// The outcome of a successful deduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionResult {
    /// The usage record created for the deduction.
    pub usage_record: UsageRecord,
    /// Total balance remaining across active buckets afterwards.
    pub remaining_total: Decimal,
}

/// The outcome of a successful revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertResult {
    /// The usage record that was reverted.
    pub usage_record_id: Uuid,
    /// Amounts restored to the buckets they were taken from.
    pub restored: Vec<BucketAllocation>,
    /// Amounts credited to the current-year bucket because their
    /// source bucket had expired.
    pub substituted: Vec<BucketAllocation>,
}

/// Plans a deduction against the in-memory bucket set and stages the
/// bucket writes, audit entries, and usage record on the transaction.
///
/// The bucket slice is updated in place so several deductions can be
/// staged against one another inside a single transaction (the
/// designation path does this, one date at a time).
pub(super) fn stage_deduction(
    txn: &mut Transaction,
    buckets: &mut [LeaveBalanceBucket],
    employee_id: &str,
    amount: Decimal,
    as_of_year: i32,
    use_date: NaiveDate,
    kind: UsageKind,
    action: AuditAction,
    actor: &str,
    reason: &str,
) -> LedgerResult<UsageRecord> {
    let plan = plan_deduction(buckets, amount, as_of_year)?;

    for allocation in &plan.allocations {
        let bucket = buckets
            .iter_mut()
            .find(|b| b.origin_year == allocation.origin_year)
            .ok_or_else(|| LedgerError::DataIntegrityViolation {
                employee_id: employee_id.to_string(),
                message: format!("planned bucket {} vanished", allocation.origin_year),
            })?;

        let before = bucket.remaining_days;
        bucket.remaining_days -= allocation.amount;
        txn.write_bucket(bucket.clone());
        txn.append_audit(AuditEntry {
            id: Uuid::new_v4(),
            action,
            employee_id: employee_id.to_string(),
            affected_year: allocation.origin_year,
            amount: allocation.amount,
            balance_before: before,
            balance_after: bucket.remaining_days,
            actor: actor.to_string(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    let record = UsageRecord {
        id: Uuid::new_v4(),
        employee_id: employee_id.to_string(),
        use_date,
        days_deducted: amount,
        allocations: plan.allocations,
        kind,
        reverted: false,
    };
    txn.insert_usage(record.clone());
    Ok(record)
}

impl Ledger {
    /// Deducts leave from an employee's balance, newest bucket first.
    ///
    /// # Arguments
    ///
    /// * `employee_id` - Must resolve through the employee directory
    /// * `amount` - Days to deduct; strictly positive, one decimal place
    /// * `as_of_year` - The fiscal year the deduction takes effect in;
    ///   must not be in the future of `today`
    /// * `use_date` - The calendar date of the leave, inside `as_of_year`
    /// * `today` - The caller's reference date
    /// * `actor` - Who approved the deduction
    ///
    /// # Errors
    ///
    /// `InsufficientBalance` rejects the whole request atomically when
    /// the active buckets cannot cover it; no partial deduction is ever
    /// committed.
    pub fn deduct(
        &self,
        employee_id: &str,
        amount: Decimal,
        as_of_year: i32,
        use_date: NaiveDate,
        today: NaiveDate,
        actor: &str,
    ) -> LedgerResult<DeductionResult> {
        let current_year = self.policy.fiscal().fiscal_year_of(today);
        if as_of_year > current_year {
            return Err(LedgerError::InvalidInput {
                field: "as_of_year".to_string(),
                message: format!("{} is in the future (current fiscal year {})", as_of_year, current_year),
            });
        }
        if !self.policy.fiscal().contains(as_of_year, use_date) {
            return Err(LedgerError::InvalidInput {
                field: "use_date".to_string(),
                message: format!("{} is not inside fiscal year {}", use_date, as_of_year),
            });
        }

        let _lock = self.locks.acquire(employee_id)?;
        self.ensure_writable(employee_id)?;
        self.resolve_profile(employee_id)?;

        let mut buckets = self.load_checked_buckets(employee_id)?;
        let mut txn = Transaction::new(employee_id);
        let reason = format!("leave on {}", use_date);
        let record = stage_deduction(
            &mut txn,
            &mut buckets,
            employee_id,
            amount,
            as_of_year,
            use_date,
            UsageKind::SelfScheduled,
            AuditAction::Deduction,
            actor,
            &reason,
        )?;
        self.store.commit(txn)?;

        let remaining_total: Decimal = buckets
            .iter()
            .filter(|b| b.is_active(as_of_year))
            .map(|b| b.remaining_days)
            .sum();

        info!(
            employee_id = employee_id,
            amount = %amount,
            remaining = %remaining_total,
            "deducted leave"
        );
        Ok(DeductionResult {
            usage_record: record,
            remaining_total,
        })
    }

    /// Reverts a previous deduction, restoring the exact amounts to the
    /// exact buckets they were taken from.
    ///
    /// If a source bucket has expired since the deduction, its share is
    /// credited to the current-year (`as_of_year`) bucket instead and
    /// the `Revert` audit entry records the substitution explicitly so
    /// the discrepancy stays auditable.
    pub fn revert(
        &self,
        usage_record_id: Uuid,
        as_of_year: i32,
        today: NaiveDate,
        actor: &str,
    ) -> LedgerResult<RevertResult> {
        let current_year = self.policy.fiscal().fiscal_year_of(today);
        if as_of_year > current_year {
            return Err(LedgerError::InvalidInput {
                field: "as_of_year".to_string(),
                message: format!("{} is in the future (current fiscal year {})", as_of_year, current_year),
            });
        }

        let record = self
            .store
            .usage_record(usage_record_id)
            .ok_or(LedgerError::UsageRecordNotFound { usage_record_id })?;
        if record.reverted {
            return Err(LedgerError::AlreadyReverted { usage_record_id });
        }

        let employee_id = record.employee_id.clone();
        let _lock = self.locks.acquire(&employee_id)?;
        self.ensure_writable(&employee_id)?;

        // Re-read under the lock; the record may have been reverted by
        // a racing caller between the check above and lock acquisition.
        let record = self
            .store
            .usage_record(usage_record_id)
            .ok_or(LedgerError::UsageRecordNotFound { usage_record_id })?;
        if record.reverted {
            return Err(LedgerError::AlreadyReverted { usage_record_id });
        }

        let mut buckets = self.load_checked_buckets(&employee_id)?;
        let mut txn = Transaction::new(&employee_id);
        let mut restored = Vec::new();
        let mut substituted = Vec::new();

        for allocation in &record.allocations {
            let source_alive = buckets
                .iter()
                .any(|b| b.origin_year == allocation.origin_year && !b.is_expired_in(as_of_year));

            let (target_year, reason) = if source_alive {
                (
                    allocation.origin_year,
                    format!("reverted usage record {}", usage_record_id),
                )
            } else {
                warn!(
                    employee_id = employee_id.as_str(),
                    origin_year = allocation.origin_year,
                    amount = %allocation.amount,
                    "revert source bucket expired; crediting current-year bucket"
                );
                (
                    as_of_year,
                    format!(
                        "reverted usage record {}; original {} bucket expired, credited {} bucket instead",
                        usage_record_id, allocation.origin_year, as_of_year
                    ),
                )
            };

            let index = match buckets.iter().position(|b| b.origin_year == target_year) {
                Some(index) => index,
                None => {
                    // No current-year bucket to substitute into yet
                    buckets.push(LeaveBalanceBucket::new(
                        &employee_id,
                        target_year,
                        Decimal::ZERO,
                    ));
                    buckets.len() - 1
                }
            };
            let bucket = &mut buckets[index];

            let before = bucket.remaining_days;
            bucket.remaining_days += allocation.amount;
            txn.write_bucket(bucket.clone());
            txn.append_audit(AuditEntry {
                id: Uuid::new_v4(),
                action: AuditAction::Revert,
                employee_id: employee_id.clone(),
                affected_year: target_year,
                amount: allocation.amount,
                balance_before: before,
                balance_after: bucket.remaining_days,
                actor: actor.to_string(),
                reason,
                timestamp: Utc::now(),
            });

            let credited = BucketAllocation {
                origin_year: target_year,
                amount: allocation.amount,
            };
            if source_alive {
                restored.push(credited);
            } else {
                substituted.push(credited);
            }
        }

        txn.mark_reverted(usage_record_id);
        self.store.commit(txn)?;

        info!(
            employee_id = employee_id.as_str(),
            usage_record_id = %usage_record_id,
            restored = restored.len(),
            substituted = substituted.len(),
            "reverted deduction"
        );
        Ok(RevertResult {
            usage_record_id,
            restored,
            substituted,
        })
    }

    /// Loads an employee's buckets, escalating if stored state already
    /// violates the non-negative invariant.
    pub(super) fn load_checked_buckets(
        &self,
        employee_id: &str,
    ) -> LedgerResult<Vec<LeaveBalanceBucket>> {
        let buckets = self.store.buckets_for(employee_id);
        for bucket in &buckets {
            if bucket.remaining_days < Decimal::ZERO {
                return Err(self.store.quarantine(
                    employee_id,
                    format!(
                        "observed negative balance {} in bucket {}",
                        bucket.remaining_days, bucket.origin_year
                    ),
                ));
            }
        }
        Ok(buckets)
    }
}
