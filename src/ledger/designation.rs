//! Compliance classification and employer designation.
//!
//! Employees granted at least 10 days must use at least 5 within the
//! fiscal year. [`Ledger::classify`] reads the current standing;
//! [`Ledger::designate`] is the administrative action that schedules
//! leave on specific dates to cover the remaining shortfall when an
//! employee has not self-scheduled enough. Designated days run through
//! the same deduction engine but are logged as `Designate` entries so
//! compliance reporting can tell the two apart.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::calculation::{ComplianceReport, ComplianceStatus, classify_usage};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AuditAction, UsageKind, UsageRecord};
use crate::notifications::ComplianceEvent;

use super::Ledger;
use super::deduction::stage_deduction;
use super::store::Transaction;

/// The outcome of a successful designation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignationResult {
    /// The employee designated for.
    pub employee_id: String,
    /// The fiscal year the designation applies to.
    pub year: i32,
    /// One usage record per designated date.
    pub records: Vec<UsageRecord>,
    /// The shortfall before the designation.
    pub shortfall_before: Decimal,
    /// The shortfall remaining afterwards.
    pub shortfall_after: Decimal,
}

/// The outcome of one compliance sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceSweepSummary {
    /// The fiscal year that was evaluated.
    pub year: i32,
    /// Employees evaluated.
    pub evaluated: usize,
    /// Notification events emitted.
    pub events_emitted: usize,
}

impl Ledger {
    /// Classifies one employee-year against the minimum-usage
    /// obligation. Read-only and idempotent for unchanged state.
    pub fn classify(&self, employee_id: &str, year: i32, today: NaiveDate) -> ComplianceReport {
        let granted = self
            .store
            .grant(employee_id, year)
            .map(|g| g.granted_days)
            .unwrap_or(Decimal::ZERO);
        let used = self.used_days(employee_id, year);
        classify_usage(
            granted,
            used,
            year,
            today,
            self.policy.fiscal(),
            self.policy.compliance(),
        )
    }

    /// Designates specific dates as employer-scheduled leave to cover
    /// an employee's outstanding shortfall.
    ///
    /// Each date deducts one whole day through the newest-first engine,
    /// all in a single transaction: either every date is designated or
    /// none is.
    ///
    /// # Errors
    ///
    /// `AlreadyCompliant` when the employee has already used the
    /// minimum; `InvalidInput` when the employee is not subject to the
    /// obligation, a date falls outside the fiscal year or is already
    /// designated, or more dates are given than the shortfall needs.
    pub fn designate(
        &self,
        employee_id: &str,
        year: i32,
        dates: &[NaiveDate],
        today: NaiveDate,
        actor: &str,
    ) -> LedgerResult<DesignationResult> {
        let current_year = self.policy.fiscal().fiscal_year_of(today);
        if year > current_year {
            return Err(LedgerError::InvalidInput {
                field: "year".to_string(),
                message: format!("{} is in the future (current fiscal year {})", year, current_year),
            });
        }
        if dates.is_empty() {
            return Err(LedgerError::InvalidInput {
                field: "dates".to_string(),
                message: "at least one date is required".to_string(),
            });
        }

        let unique_dates: BTreeSet<NaiveDate> = dates.iter().copied().collect();
        for date in &unique_dates {
            if !self.policy.fiscal().contains(year, *date) {
                return Err(LedgerError::InvalidInput {
                    field: "dates".to_string(),
                    message: format!("{} is not inside fiscal year {}", date, year),
                });
            }
        }

        let _lock = self.locks.acquire(employee_id)?;
        self.ensure_writable(employee_id)?;
        self.resolve_profile(employee_id)?;

        let report = self.classify(employee_id, year, today);
        if !report.subject_to_obligation {
            return Err(LedgerError::InvalidInput {
                field: "employee_id".to_string(),
                message: format!(
                    "granted {} days, below the {}-day obligation threshold",
                    report.granted,
                    self.policy.compliance().obligation_threshold_days
                ),
            });
        }
        if report.used >= self.policy.compliance().minimum_usage_days {
            return Err(LedgerError::AlreadyCompliant {
                employee_id: employee_id.to_string(),
                year,
                used: report.used,
            });
        }

        let requested = Decimal::from(unique_dates.len() as i64);
        if requested > report.shortfall {
            return Err(LedgerError::InvalidInput {
                field: "dates".to_string(),
                message: format!(
                    "{} dates exceed the remaining shortfall of {}",
                    unique_dates.len(),
                    report.shortfall
                ),
            });
        }

        let already_designated: BTreeSet<NaiveDate> = self
            .store
            .usage_for(employee_id)
            .into_iter()
            .filter(|r| !r.reverted && r.kind == UsageKind::Designated)
            .map(|r| r.use_date)
            .collect();
        if let Some(collision) = unique_dates.intersection(&already_designated).next() {
            return Err(LedgerError::InvalidInput {
                field: "dates".to_string(),
                message: format!("{} is already designated", collision),
            });
        }

        let mut buckets = self.load_checked_buckets(employee_id)?;
        let mut txn = Transaction::new(employee_id);
        let mut records = Vec::new();
        for date in &unique_dates {
            let reason = format!("employer-designated leave on {}", date);
            let record = stage_deduction(
                &mut txn,
                &mut buckets,
                employee_id,
                Decimal::ONE,
                year,
                *date,
                UsageKind::Designated,
                AuditAction::Designate,
                actor,
                &reason,
            )?;
            records.push(record);
        }
        self.store.commit(txn)?;

        let shortfall_after = report.shortfall - requested;
        info!(
            employee_id = employee_id,
            year = year,
            designated = records.len(),
            shortfall_after = %shortfall_after,
            "designated leave for compliance"
        );
        Ok(DesignationResult {
            employee_id: employee_id.to_string(),
            year,
            records,
            shortfall_before: report.shortfall,
            shortfall_after,
        })
    }

    /// Evaluates every employee holding buckets and emits notification
    /// events for unmet obligations and balance about to expire at the
    /// end of the fiscal year. Read-only; delivery is the sink's
    /// problem.
    pub fn compliance_sweep(&self, year: i32, today: NaiveDate) -> ComplianceSweepSummary {
        let deadline = self.policy.fiscal().year_end(year);
        let days_left = (deadline - today).num_days();
        let expiring_window = self.policy.compliance().expiring_soon_window_days as i64;

        let mut summary = ComplianceSweepSummary {
            year,
            evaluated: 0,
            events_emitted: 0,
        };

        for employee_id in self.store.employee_ids_with_buckets() {
            summary.evaluated += 1;

            let report = self.classify(&employee_id, year, today);
            if report.subject_to_obligation && report.status != ComplianceStatus::Compliant {
                self.sink.notify(ComplianceEvent::NonCompliant {
                    employee_id: employee_id.clone(),
                    shortfall: report.shortfall,
                });
                summary.events_emitted += 1;
            }

            // The prior-year bucket dies when this fiscal year ends
            if (0..=expiring_window).contains(&days_left) {
                if let Some(bucket) = self.store.bucket(&employee_id, year - 1) {
                    if bucket.is_active(year) {
                        self.sink.notify(ComplianceEvent::ExpiringSoon {
                            employee_id: employee_id.clone(),
                            amount: bucket.remaining_days,
                            days_left,
                        });
                        summary.events_emitted += 1;
                    }
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyLoader;
    use crate::directory::InMemoryDirectory;
    use crate::notifications::RecordingSink;
    use crate::notifications::NotificationSink;
    use std::str::FromStr;
    use std::sync::Arc;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A ledger with one employee granted 10.0 days for fiscal 2025.
    fn granted_ledger() -> (Ledger, Arc<RecordingSink>) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.insert_active("emp_001", date(2024, 10, 1));
        let policy = PolicyLoader::load("./config/art39").unwrap().into_policy();
        let sink = Arc::new(RecordingSink::new());
        let ledger = Ledger::new(policy, directory)
            .with_notification_sink(Arc::clone(&sink) as Arc<dyn NotificationSink>);
        ledger
            .issue_grant("emp_001", 2025, date(2025, 4, 1), "system")
            .unwrap();
        (ledger, sink)
    }

    #[test]
    fn test_classify_unused_mid_year_is_compliant() {
        let (ledger, _) = granted_ledger();

        let report = ledger.classify("emp_001", 2025, date(2025, 6, 1));

        assert_eq!(report.status, ComplianceStatus::Compliant);
        assert!(report.subject_to_obligation);
        assert_eq!(report.shortfall, dec("5.0"));
    }

    #[test]
    fn test_classify_counts_only_unreverted_usage() {
        let (ledger, _) = granted_ledger();

        let result = ledger
            .deduct(
                "emp_001",
                dec("5.0"),
                2025,
                date(2025, 5, 12),
                date(2025, 5, 1),
                "hr_admin",
            )
            .unwrap();
        assert_eq!(
            ledger.classify("emp_001", 2025, date(2025, 6, 1)).status,
            ComplianceStatus::Compliant
        );
        assert_eq!(
            ledger.classify("emp_001", 2025, date(2025, 6, 1)).used,
            dec("5.0")
        );

        ledger
            .revert(result.usage_record.id, 2025, date(2025, 6, 2), "hr_admin")
            .unwrap();
        assert_eq!(
            ledger.classify("emp_001", 2025, date(2025, 6, 3)).used,
            dec("0.0")
        );
    }

    /// DG-001: designation covers the shortfall with Designate entries
    #[test]
    fn test_designate_covers_shortfall() {
        let (ledger, _) = granted_ledger();

        ledger
            .deduct(
                "emp_001",
                dec("2.0"),
                2025,
                date(2025, 5, 12),
                date(2025, 5, 1),
                "hr_admin",
            )
            .unwrap();

        let dates = vec![date(2026, 2, 2), date(2026, 2, 3), date(2026, 2, 4)];
        let result = ledger
            .designate("emp_001", 2025, &dates, date(2026, 1, 15), "hr_admin")
            .unwrap();

        assert_eq!(result.shortfall_before, dec("3.0"));
        assert_eq!(result.shortfall_after, dec("0.0"));
        assert_eq!(result.records.len(), 3);
        assert!(result.records.iter().all(|r| r.kind == UsageKind::Designated));

        let designate_entries = ledger
            .store()
            .audit_for_employee("emp_001")
            .into_iter()
            .filter(|e| e.action == AuditAction::Designate)
            .count();
        assert_eq!(designate_entries, 3);

        assert_eq!(
            ledger.classify("emp_001", 2025, date(2026, 2, 10)).status,
            ComplianceStatus::Compliant
        );
    }

    /// DG-002: designation for a compliant employee is rejected
    #[test]
    fn test_designate_already_compliant() {
        let (ledger, _) = granted_ledger();

        ledger
            .deduct(
                "emp_001",
                dec("5.0"),
                2025,
                date(2025, 5, 12),
                date(2025, 5, 1),
                "hr_admin",
            )
            .unwrap();

        let result = ledger.designate(
            "emp_001",
            2025,
            &[date(2026, 2, 2)],
            date(2026, 1, 15),
            "hr_admin",
        );

        match result.unwrap_err() {
            LedgerError::AlreadyCompliant { used, .. } => {
                assert_eq!(used, dec("5.0"));
            }
            other => panic!("Expected AlreadyCompliant, got {:?}", other),
        }
    }

    #[test]
    fn test_designate_below_threshold_is_rejected() {
        // Hired recently: 2025 grant is 0 days, not subject
        let directory = Arc::new(InMemoryDirectory::new());
        directory.insert_active("emp_002", date(2025, 2, 1));
        let policy = PolicyLoader::load("./config/art39").unwrap().into_policy();
        let ledger = Ledger::new(policy, directory);
        ledger
            .issue_grant("emp_002", 2025, date(2025, 4, 1), "system")
            .unwrap();

        let result = ledger.designate(
            "emp_002",
            2025,
            &[date(2026, 2, 2)],
            date(2026, 1, 15),
            "hr_admin",
        );

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_designate_rejects_more_dates_than_shortfall() {
        let (ledger, _) = granted_ledger();

        let dates: Vec<NaiveDate> = (1..=6).map(|d| date(2026, 2, d)).collect();
        let result = ledger.designate("emp_001", 2025, &dates, date(2026, 1, 15), "hr_admin");

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_designate_rejects_already_designated_date() {
        let (ledger, _) = granted_ledger();

        ledger
            .designate(
                "emp_001",
                2025,
                &[date(2026, 2, 2)],
                date(2026, 1, 15),
                "hr_admin",
            )
            .unwrap();

        let result = ledger.designate(
            "emp_001",
            2025,
            &[date(2026, 2, 2)],
            date(2026, 1, 15),
            "hr_admin",
        );

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_designate_rejects_date_outside_year() {
        let (ledger, _) = granted_ledger();

        let result = ledger.designate(
            "emp_001",
            2025,
            &[date(2026, 4, 2)],
            date(2026, 1, 15),
            "hr_admin",
        );

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_designate_is_atomic_on_insufficient_balance() {
        let (ledger, _) = granted_ledger();

        // Drain the bucket directly so the balance is short while
        // `used` stays below the obligation minimum
        let store = ledger.store();
        let mut bucket = store.bucket("emp_001", 2025).unwrap();
        bucket.remaining_days = dec("1.0");
        let mut txn = Transaction::new("emp_001");
        txn.write_bucket(bucket);
        txn.append_audit(crate::models::AuditEntry {
            id: uuid::Uuid::new_v4(),
            action: AuditAction::Deduction,
            employee_id: "emp_001".to_string(),
            affected_year: 2025,
            amount: dec("9.0"),
            balance_before: dec("10.0"),
            balance_after: dec("1.0"),
            actor: "fixture".to_string(),
            reason: "test fixture".to_string(),
            timestamp: chrono::Utc::now(),
        });
        store.commit(txn).unwrap();

        let dates = vec![date(2026, 2, 2), date(2026, 2, 3)];
        let result = ledger.designate("emp_001", 2025, &dates, date(2026, 1, 15), "hr_admin");

        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InsufficientBalance { .. }
        ));
        // Nothing was committed
        assert_eq!(
            store.bucket("emp_001", 2025).unwrap().remaining_days,
            dec("1.0")
        );
        assert!(store.usage_for("emp_001").is_empty());
    }

    /// DG-003: the sweep emits shortfall and expiring-balance events
    #[test]
    fn test_compliance_sweep_emits_events() {
        let (ledger, sink) = granted_ledger();

        // Inside the at-risk window, nothing used yet
        let summary = ledger.compliance_sweep(2025, date(2026, 2, 15));

        assert_eq!(summary.evaluated, 1);
        let events = sink.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            ComplianceEvent::NonCompliant { shortfall, .. } if *shortfall == dec("5.0")
        )));
        // 44 days to the 2026-03-31 deadline; the 2024 bucket does not
        // exist here, so only the shortfall event fires
        assert_eq!(summary.events_emitted, events.len());
    }

    #[test]
    fn test_compliance_sweep_reports_expiring_prior_year_bucket() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.insert_active("emp_001", date(2018, 10, 1));
        let policy = PolicyLoader::load("./config/art39").unwrap().into_policy();
        let sink = Arc::new(RecordingSink::new());
        let ledger = Ledger::new(policy, directory)
            .with_notification_sink(Arc::clone(&sink) as Arc<dyn NotificationSink>);
        ledger
            .issue_grant("emp_001", 2024, date(2024, 4, 1), "system")
            .unwrap();
        ledger
            .issue_grant("emp_001", 2025, date(2025, 4, 1), "system")
            .unwrap();

        ledger.compliance_sweep(2025, date(2026, 2, 15));

        let events = sink.events();
        assert!(events.iter().any(|e| matches!(
            e,
            ComplianceEvent::ExpiringSoon { amount, days_left, .. }
                if *amount == dec("18.0") && *days_left == 44
        )));
    }

    #[test]
    fn test_sweep_outside_window_emits_no_expiring_event() {
        let (ledger, sink) = granted_ledger();

        // Mid-year: deadline far away, balance untouched
        ledger.compliance_sweep(2025, date(2025, 6, 1));

        assert!(!sink
            .events()
            .iter()
            .any(|e| matches!(e, ComplianceEvent::ExpiringSoon { .. })));
    }
}
