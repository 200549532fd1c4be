//! Reporting read API.
//!
//! Employers must be able to produce the statutory leave ledger
//! document for any past fiscal year. This module regenerates it from
//! the audit log alone, without re-deriving bucket state: the
//! append-only entry sequence carries every grant, deduction,
//! designation, revert, carryover, and expiration, and the fiscal-year
//! boundaries are marked by the `Carryover` entries themselves.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::Ledger;
use crate::models::{AuditAction, AuditEntry};

/// One movement in the annual ledger document, with the running
/// balance after it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerMovement {
    /// The recorded action.
    pub action: AuditAction,
    /// The bucket year the action touched.
    pub affected_year: i32,
    /// The magnitude of the change.
    pub amount: Decimal,
    /// Total balance across buckets after this movement.
    pub running_balance: Decimal,
    /// Who performed the action.
    pub actor: String,
    /// The recorded explanation.
    pub reason: String,
    /// When the movement was committed.
    pub timestamp: DateTime<Utc>,
}

/// The statutory leave ledger document for one employee-year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnualLeaveLedger {
    /// The employee the document covers.
    pub employee_id: String,
    /// The fiscal year the document covers.
    pub year: i32,
    /// Days granted during the year.
    pub granted: Decimal,
    /// Days carried in from the prior year at the opening boundary.
    pub carried_in: Decimal,
    /// Days used during the year (self-scheduled and designated).
    pub used: Decimal,
    /// The employer-designated share of `used`.
    pub designated: Decimal,
    /// Days restored by reverts during the year.
    pub reverted: Decimal,
    /// Days permanently lost at the closing boundary (window and cap).
    pub expired: Decimal,
    /// Balance at the end of the covered period.
    pub closing_balance: Decimal,
    /// Every movement in order, with running balances.
    pub movements: Vec<LedgerMovement>,
}

/// Builds the annual ledger document from one employee's audit entries.
///
/// `entries` must be that employee's full audit history in append
/// order, as returned by the store. The fiscal-year segment is bounded
/// by `Carryover` entries: the year opens after the entry closing
/// `year - 1` and closes with the entry closing `year` (or runs to the
/// end of the log for a year still open). A grant for the covered year
/// that was issued before the opening boundary ran is folded in at the
/// opening.
pub fn build_annual_ledger(
    entries: &[AuditEntry],
    employee_id: &str,
    year: i32,
) -> AnnualLeaveLedger {
    let open_boundary = entries
        .iter()
        .position(|e| e.action == AuditAction::Carryover && e.affected_year == year - 1);
    let carried_in = open_boundary
        .map(|i| entries[i].amount)
        .unwrap_or(Decimal::ZERO);
    let start = open_boundary.map(|i| i + 1).unwrap_or(0);

    let close_boundary = entries
        .iter()
        .position(|e| e.action == AuditAction::Carryover && e.affected_year == year);
    let end = close_boundary.map(|i| i + 1).unwrap_or(entries.len());

    let mut document = AnnualLeaveLedger {
        employee_id: employee_id.to_string(),
        year,
        granted: Decimal::ZERO,
        carried_in,
        used: Decimal::ZERO,
        designated: Decimal::ZERO,
        reverted: Decimal::ZERO,
        expired: Decimal::ZERO,
        closing_balance: carried_in,
        movements: Vec::new(),
    };

    // A grant for the covered year may have been issued ahead of the
    // boundary run; fold it in at the opening so the document still
    // carries it.
    let pre_boundary_grants = entries[..start]
        .iter()
        .filter(|e| e.action == AuditAction::Grant && e.affected_year == year);
    let segment = pre_boundary_grants.chain(entries[start..end].iter());

    let mut running = carried_in;
    for entry in segment {
        // Symmetrically, a grant for a later year issued ahead of this
        // year's boundary belongs to that year's document, not here.
        if entry.affected_year > year {
            continue;
        }
        match entry.action {
            AuditAction::Grant => {
                document.granted += entry.amount;
                running += entry.amount;
            }
            AuditAction::Deduction => {
                document.used += entry.amount;
                running -= entry.amount;
            }
            AuditAction::Designate => {
                document.used += entry.amount;
                document.designated += entry.amount;
                running -= entry.amount;
            }
            AuditAction::Revert => {
                document.reverted += entry.amount;
                running += entry.amount;
            }
            AuditAction::Expiration => {
                document.expired += entry.amount;
                running -= entry.amount;
            }
            AuditAction::Carryover => {
                // The closing boundary; the balance is already net of
                // the cap excess logged as an expiration
            }
        }
        document.movements.push(LedgerMovement {
            action: entry.action,
            affected_year: entry.affected_year,
            amount: entry.amount,
            running_balance: running,
            actor: entry.actor.clone(),
            reason: entry.reason.clone(),
            timestamp: entry.timestamp,
        });
    }

    document.closing_balance = running;
    document
}

impl Ledger {
    /// Returns one employee's full audit history in append order.
    pub fn audit_by_employee(&self, employee_id: &str) -> Vec<AuditEntry> {
        self.store().audit_for_employee(employee_id)
    }

    /// Returns one employee's audit entries touching one bucket year.
    pub fn audit_by_year(&self, employee_id: &str, affected_year: i32) -> Vec<AuditEntry> {
        self.store().audit_for_year(employee_id, affected_year)
    }

    /// Returns every audit entry committed inside a timestamp range.
    pub fn audit_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<AuditEntry> {
        self.store().audit_between(start, end)
    }

    /// Regenerates the statutory leave ledger document for one
    /// employee-year from the audit log alone.
    pub fn annual_leave_ledger(&self, employee_id: &str, year: i32) -> AnnualLeaveLedger {
        build_annual_ledger(
            &self.store().audit_for_employee(employee_id),
            employee_id,
            year,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use uuid::Uuid;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn entry(action: AuditAction, affected_year: i32, amount: &str) -> AuditEntry {
        AuditEntry {
            id: Uuid::new_v4(),
            action,
            employee_id: "emp_001".to_string(),
            affected_year,
            amount: dec(amount),
            balance_before: Decimal::ZERO,
            balance_after: Decimal::ZERO,
            actor: "test".to_string(),
            reason: "test entry".to_string(),
            timestamp: Utc::now(),
        }
    }

    /// A two-year history: grant 10 in 2024, use 3, carry 7 into 2025,
    /// grant 11 in 2025, use 4, year-end 2025 -> 2026 expires the
    /// leftover 4 of the 2024 bucket and carries 7.
    fn two_year_history() -> Vec<AuditEntry> {
        vec![
            entry(AuditAction::Grant, 2024, "10.0"),
            entry(AuditAction::Deduction, 2024, "3.0"),
            entry(AuditAction::Carryover, 2024, "7.0"),
            entry(AuditAction::Grant, 2025, "11.0"),
            entry(AuditAction::Deduction, 2025, "4.0"),
            entry(AuditAction::Expiration, 2024, "7.0"),
            entry(AuditAction::Carryover, 2025, "7.0"),
        ]
    }

    #[test]
    fn test_open_year_document() {
        let entries = vec![
            entry(AuditAction::Grant, 2025, "10.0"),
            entry(AuditAction::Deduction, 2025, "2.5"),
        ];

        let document = build_annual_ledger(&entries, "emp_001", 2025);

        assert_eq!(document.granted, dec("10.0"));
        assert_eq!(document.carried_in, dec("0.0"));
        assert_eq!(document.used, dec("2.5"));
        assert_eq!(document.closing_balance, dec("7.5"));
        assert_eq!(document.movements.len(), 2);
    }

    #[test]
    fn test_first_year_of_two_year_history() {
        let document = build_annual_ledger(&two_year_history(), "emp_001", 2024);

        assert_eq!(document.granted, dec("10.0"));
        assert_eq!(document.carried_in, dec("0.0"));
        assert_eq!(document.used, dec("3.0"));
        assert_eq!(document.expired, dec("0.0"));
        // The segment closes at the 2024 -> 2025 boundary
        assert_eq!(document.closing_balance, dec("7.0"));
    }

    #[test]
    fn test_second_year_reads_carried_in_from_boundary() {
        let document = build_annual_ledger(&two_year_history(), "emp_001", 2025);

        assert_eq!(document.carried_in, dec("7.0"));
        assert_eq!(document.granted, dec("11.0"));
        assert_eq!(document.used, dec("4.0"));
        assert_eq!(document.expired, dec("7.0"));
        // 7 in + 11 granted - 4 used - 7 expired
        assert_eq!(document.closing_balance, dec("7.0"));
    }

    #[test]
    fn test_running_balance_tracks_each_movement() {
        let document = build_annual_ledger(&two_year_history(), "emp_001", 2025);

        let balances: Vec<Decimal> = document
            .movements
            .iter()
            .map(|m| m.running_balance)
            .collect();
        assert_eq!(
            balances,
            vec![
                dec("18.0"), // grant 11 on top of 7 carried
                dec("14.0"), // deduction 4
                dec("7.0"),  // expiration 7
                dec("7.0"),  // closing carryover, no delta
            ]
        );
    }

    #[test]
    fn test_designated_days_are_split_out() {
        let entries = vec![
            entry(AuditAction::Grant, 2025, "10.0"),
            entry(AuditAction::Deduction, 2025, "2.0"),
            entry(AuditAction::Designate, 2025, "3.0"),
        ];

        let document = build_annual_ledger(&entries, "emp_001", 2025);

        assert_eq!(document.used, dec("5.0"));
        assert_eq!(document.designated, dec("3.0"));
    }

    #[test]
    fn test_reverted_days_restore_the_balance() {
        let entries = vec![
            entry(AuditAction::Grant, 2025, "10.0"),
            entry(AuditAction::Deduction, 2025, "4.0"),
            entry(AuditAction::Revert, 2025, "4.0"),
        ];

        let document = build_annual_ledger(&entries, "emp_001", 2025);

        assert_eq!(document.used, dec("4.0"));
        assert_eq!(document.reverted, dec("4.0"));
        assert_eq!(document.closing_balance, dec("10.0"));
    }

    #[test]
    fn test_grant_issued_before_boundary_is_folded_in() {
        let entries = vec![
            entry(AuditAction::Grant, 2024, "10.0"),
            // The 2025 grant posts before the 2024 -> 2025 boundary ran
            entry(AuditAction::Grant, 2025, "11.0"),
            entry(AuditAction::Carryover, 2024, "10.0"),
            entry(AuditAction::Deduction, 2025, "4.0"),
        ];

        let doc_2024 = build_annual_ledger(&entries, "emp_001", 2024);
        assert_eq!(doc_2024.granted, dec("10.0"));
        assert_eq!(doc_2024.closing_balance, dec("10.0"));

        let doc_2025 = build_annual_ledger(&entries, "emp_001", 2025);
        assert_eq!(doc_2025.carried_in, dec("10.0"));
        assert_eq!(doc_2025.granted, dec("11.0"));
        assert_eq!(doc_2025.used, dec("4.0"));
        assert_eq!(doc_2025.closing_balance, dec("17.0"));
    }

    #[test]
    fn test_document_for_year_with_no_entries() {
        let document = build_annual_ledger(&[], "emp_001", 2025);

        assert_eq!(document.granted, Decimal::ZERO);
        assert_eq!(document.closing_balance, Decimal::ZERO);
        assert!(document.movements.is_empty());
    }
}
