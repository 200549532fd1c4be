//! Transactional bucket/usage/audit storage.
//!
//! The store keeps the bucket table, the grant table, the usage-record
//! table, and the append-only audit log behind one write lock, so a
//! staged [`Transaction`] commits atomically: readers never observe a
//! bucket mutation without its audit entry. A commit that carries a
//! state change but no audit entry is rejected outright; the pairing
//! rule is enforced by the only code path that can write.
//!
//! Integrity is checked at commit time. A negative balance, or an
//! active total above the cap when a carryover commit asks for the cap
//! to be verified, quarantines the employee: all further writes for
//! them fail until the data is repaired out of band.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::error;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{AuditEntry, FiscalYearGrant, LeaveBalanceBucket, UsageRecord};

/// A cap verification attached to a carryover commit.
#[derive(Debug, Clone, Copy)]
struct CapCheck {
    cap: Decimal,
    fiscal_year: i32,
}

/// A staged unit of work for one employee.
///
/// All writes are buffered here and applied by [`LedgerStore::commit`]
/// in one atomic step, or not at all.
#[derive(Debug)]
pub struct Transaction {
    employee_id: String,
    bucket_writes: Vec<LeaveBalanceBucket>,
    grant_writes: Vec<FiscalYearGrant>,
    usage_inserts: Vec<UsageRecord>,
    usage_revert_marks: Vec<Uuid>,
    audit_appends: Vec<AuditEntry>,
    cap_check: Option<CapCheck>,
}

impl Transaction {
    /// Starts an empty transaction for one employee.
    pub fn new(employee_id: &str) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            bucket_writes: Vec::new(),
            grant_writes: Vec::new(),
            usage_inserts: Vec::new(),
            usage_revert_marks: Vec::new(),
            audit_appends: Vec::new(),
            cap_check: None,
        }
    }

    /// Stages a bucket insert or update.
    pub fn write_bucket(&mut self, bucket: LeaveBalanceBucket) {
        self.bucket_writes.push(bucket);
    }

    /// Stages a grant insert.
    pub fn write_grant(&mut self, grant: FiscalYearGrant) {
        self.grant_writes.push(grant);
    }

    /// Stages a usage-record insert.
    pub fn insert_usage(&mut self, record: UsageRecord) {
        self.usage_inserts.push(record);
    }

    /// Stages setting the reverted flag on a usage record.
    pub fn mark_reverted(&mut self, usage_record_id: Uuid) {
        self.usage_revert_marks.push(usage_record_id);
    }

    /// Stages an audit-log append.
    pub fn append_audit(&mut self, entry: AuditEntry) {
        self.audit_appends.push(entry);
    }

    /// Asks commit to verify the active balance stays within the cap
    /// for the given fiscal year. Set by carryover commits only; the
    /// cap does not bind mid-year.
    pub fn verify_cap(&mut self, cap: Decimal, fiscal_year: i32) {
        self.cap_check = Some(CapCheck { cap, fiscal_year });
    }

    fn has_state_change(&self) -> bool {
        !self.bucket_writes.is_empty()
            || !self.grant_writes.is_empty()
            || !self.usage_inserts.is_empty()
            || !self.usage_revert_marks.is_empty()
    }
}

#[derive(Debug, Default)]
struct Tables {
    buckets: HashMap<(String, i32), LeaveBalanceBucket>,
    grants: HashMap<(String, i32), FiscalYearGrant>,
    usage: HashMap<Uuid, UsageRecord>,
    audit: Vec<AuditEntry>,
    quarantined: HashSet<String>,
}

/// The ledger's transactional store.
#[derive(Debug, Default)]
pub struct LedgerStore {
    tables: RwLock<Tables>,
}

impl LedgerStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a staged transaction atomically.
    ///
    /// Every check runs before the first write is applied, so a failed
    /// commit leaves the store untouched.
    pub fn commit(&self, txn: Transaction) -> LedgerResult<()> {
        let mut tables = self.tables.write().expect("store lock poisoned");

        if tables.quarantined.contains(&txn.employee_id) {
            return Err(LedgerError::DataIntegrityViolation {
                employee_id: txn.employee_id.clone(),
                message: "employee is quarantined; writes are halted".to_string(),
            });
        }

        if txn.has_state_change() && txn.audit_appends.is_empty() {
            return Err(LedgerError::DataIntegrityViolation {
                employee_id: txn.employee_id.clone(),
                message: "state change staged without an audit entry".to_string(),
            });
        }

        for bucket in &txn.bucket_writes {
            if bucket.remaining_days < Decimal::ZERO {
                return Err(Self::quarantine_locked(
                    &mut tables,
                    &txn.employee_id,
                    format!(
                        "bucket {} would hold negative balance {}",
                        bucket.origin_year, bucket.remaining_days
                    ),
                ));
            }
        }

        for grant in &txn.grant_writes {
            let key = (grant.employee_id.clone(), grant.grant_year);
            if tables.grants.contains_key(&key) {
                return Err(LedgerError::AlreadyGranted {
                    employee_id: grant.employee_id.clone(),
                    year: grant.grant_year,
                });
            }
        }

        for id in &txn.usage_revert_marks {
            if !tables.usage.contains_key(id) {
                return Err(LedgerError::UsageRecordNotFound {
                    usage_record_id: *id,
                });
            }
        }

        if let Some(check) = txn.cap_check {
            let mut merged: HashMap<i32, Decimal> = tables
                .buckets
                .iter()
                .filter(|((id, _), b)| *id == txn.employee_id && b.is_active(check.fiscal_year))
                .map(|((_, year), b)| (*year, b.remaining_days))
                .collect();
            for bucket in &txn.bucket_writes {
                if bucket.is_active(check.fiscal_year) {
                    merged.insert(bucket.origin_year, bucket.remaining_days);
                } else {
                    merged.remove(&bucket.origin_year);
                }
            }
            let total: Decimal = merged.values().copied().sum();
            if total > check.cap {
                return Err(Self::quarantine_locked(
                    &mut tables,
                    &txn.employee_id,
                    format!(
                        "active balance {} would exceed the {}-day cap after carryover",
                        total, check.cap
                    ),
                ));
            }
        }

        for bucket in txn.bucket_writes {
            tables
                .buckets
                .insert((bucket.employee_id.clone(), bucket.origin_year), bucket);
        }
        for grant in txn.grant_writes {
            tables
                .grants
                .insert((grant.employee_id.clone(), grant.grant_year), grant);
        }
        for record in txn.usage_inserts {
            tables.usage.insert(record.id, record);
        }
        for id in txn.usage_revert_marks {
            if let Some(record) = tables.usage.get_mut(&id) {
                record.reverted = true;
            }
        }
        tables.audit.extend(txn.audit_appends);

        Ok(())
    }

    /// Quarantines an employee and returns the integrity error.
    ///
    /// Called when stored state is observed to violate an invariant;
    /// the condition is escalated, never silently repaired.
    pub fn quarantine(&self, employee_id: &str, message: String) -> LedgerError {
        let mut tables = self.tables.write().expect("store lock poisoned");
        Self::quarantine_locked(&mut tables, employee_id, message)
    }

    fn quarantine_locked(
        tables: &mut Tables,
        employee_id: &str,
        message: String,
    ) -> LedgerError {
        error!(
            employee_id = employee_id,
            message = message.as_str(),
            "data integrity violation; quarantining employee"
        );
        tables.quarantined.insert(employee_id.to_string());
        LedgerError::DataIntegrityViolation {
            employee_id: employee_id.to_string(),
            message,
        }
    }

    /// Returns true if writes for the employee are halted.
    pub fn is_quarantined(&self, employee_id: &str) -> bool {
        self.tables
            .read()
            .expect("store lock poisoned")
            .quarantined
            .contains(employee_id)
    }

    /// Returns all buckets for one employee, in no particular order.
    pub fn buckets_for(&self, employee_id: &str) -> Vec<LeaveBalanceBucket> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .buckets
            .iter()
            .filter(|((id, _), _)| id == employee_id)
            .map(|(_, b)| b.clone())
            .collect()
    }

    /// Returns one bucket by its key.
    pub fn bucket(&self, employee_id: &str, origin_year: i32) -> Option<LeaveBalanceBucket> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .buckets
            .get(&(employee_id.to_string(), origin_year))
            .cloned()
    }

    /// Returns the grant for one employee-year.
    pub fn grant(&self, employee_id: &str, year: i32) -> Option<FiscalYearGrant> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .grants
            .get(&(employee_id.to_string(), year))
            .cloned()
    }

    /// Returns one usage record by id.
    pub fn usage_record(&self, id: Uuid) -> Option<UsageRecord> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables.usage.get(&id).cloned()
    }

    /// Returns all usage records for one employee.
    pub fn usage_for(&self, employee_id: &str) -> Vec<UsageRecord> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .usage
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect()
    }

    /// Returns every employee id holding at least one bucket.
    pub fn employee_ids_with_buckets(&self) -> Vec<String> {
        let tables = self.tables.read().expect("store lock poisoned");
        let mut ids: Vec<String> = tables
            .buckets
            .keys()
            .map(|(id, _)| id.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort();
        ids
    }

    /// Returns the full audit log in append order.
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables.audit.clone()
    }

    /// Returns the audit entries for one employee, in append order.
    pub fn audit_for_employee(&self, employee_id: &str) -> Vec<AuditEntry> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .audit
            .iter()
            .filter(|e| e.employee_id == employee_id)
            .cloned()
            .collect()
    }

    /// Returns the audit entries for one employee touching one bucket
    /// year, in append order.
    pub fn audit_for_year(&self, employee_id: &str, affected_year: i32) -> Vec<AuditEntry> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .audit
            .iter()
            .filter(|e| e.employee_id == employee_id && e.affected_year == affected_year)
            .cloned()
            .collect()
    }

    /// Returns the audit entries committed inside a timestamp range.
    pub fn audit_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<AuditEntry> {
        let tables = self.tables.read().expect("store lock poisoned");
        tables
            .audit
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp < end)
            .cloned()
            .collect()
    }
}
