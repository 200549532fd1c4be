//! Year-end carryover planning.
//!
//! This module computes, for one employee, what happens at the boundary
//! between two fiscal years: which buckets expire outright, how much of
//! the closing year's balance survives into the next year, and how much
//! is lost to the statutory cap. Planning is pure; the ledger applies
//! the plan transactionally.
//!
//! Expiration is the only path by which days are permanently lost, and
//! every expired amount is reported explicitly so it can be audited.

use rust_decimal::Decimal;

use crate::models::LeaveBalanceBucket;

/// One bucket that expires at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedExpiration {
    /// The origin year of the expiring bucket.
    pub origin_year: i32,
    /// The bucket's balance before expiration.
    pub remaining_before: Decimal,
    /// The amount permanently lost (equals `remaining_before` for a
    /// window expiration; the cap excess for the closing-year bucket).
    pub expired_amount: Decimal,
}

/// The planned outcome of one employee's year-end processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarryoverPlan {
    /// Buckets whose 2-fiscal-year window closes at `to_year`, with the
    /// amounts lost.
    pub expirations: Vec<PlannedExpiration>,
    /// The closing-year balance that survives into the next fiscal year.
    pub carried_days: Decimal,
    /// The closing-year bucket's balance before the cap was applied.
    pub from_remaining_before: Decimal,
}

/// Plans year-end processing for one employee's buckets.
///
/// # Arguments
///
/// * `buckets` - All buckets for one employee
/// * `from_year` - The fiscal year being closed
/// * `to_year` - The fiscal year being opened (`from_year + 1`)
/// * `incoming_grant` - The `to_year` entitlement already issued or
///   about to be issued, which counts against the cap
/// * `cap` - The statutory cap on total active balance after carryover
///
/// # Returns
///
/// Returns the [`CarryoverPlan`]. The carried amount is
/// `min(closing balance, cap - incoming_grant)`, never negative; the
/// remainder of the closing bucket is reported as an expiration.
pub fn plan_carryover(
    buckets: &[LeaveBalanceBucket],
    from_year: i32,
    to_year: i32,
    incoming_grant: Decimal,
    cap: Decimal,
) -> CarryoverPlan {
    let mut expirations = Vec::new();

    // Window expirations: anything older than the closing-year bucket.
    let mut windowed: Vec<&LeaveBalanceBucket> = buckets
        .iter()
        .filter(|b| !b.expired && b.origin_year < from_year && b.expires_at <= to_year)
        .collect();
    windowed.sort_by_key(|b| b.origin_year);
    for bucket in windowed {
        expirations.push(PlannedExpiration {
            origin_year: bucket.origin_year,
            remaining_before: bucket.remaining_days,
            expired_amount: bucket.remaining_days,
        });
    }

    let from_remaining_before = buckets
        .iter()
        .find(|b| b.origin_year == from_year && !b.expired)
        .map(|b| b.remaining_days)
        .unwrap_or(Decimal::ZERO);

    let headroom = (cap - incoming_grant).max(Decimal::ZERO);
    let carried_days = from_remaining_before.min(headroom);
    let cap_excess = from_remaining_before - carried_days;

    if cap_excess > Decimal::ZERO {
        expirations.push(PlannedExpiration {
            origin_year: from_year,
            remaining_before: from_remaining_before,
            expired_amount: cap_excess,
        });
    }

    CarryoverPlan {
        expirations,
        carried_days,
        from_remaining_before,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bucket(origin_year: i32, remaining: &str) -> LeaveBalanceBucket {
        let mut b = LeaveBalanceBucket::new("emp_001", origin_year, dec("20.0"));
        b.remaining_days = dec(remaining);
        b
    }

    /// CP-001: carryover under the cap transfers everything
    #[test]
    fn test_full_carryover_under_cap() {
        let buckets = vec![bucket(2024, "8.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("15.0"), dec("40.0"));

        assert_eq!(plan.carried_days, dec("8.0"));
        assert!(plan.expirations.is_empty());
    }

    /// CP-002: the cap limits the transfer, excess is reported exactly
    #[test]
    fn test_cap_limits_transfer_and_reports_excess() {
        let buckets = vec![bucket(2024, "30.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("15.0"), dec("40.0"));

        assert_eq!(plan.carried_days, dec("25.0"));
        assert_eq!(plan.expirations.len(), 1);
        assert_eq!(plan.expirations[0].origin_year, 2024);
        assert_eq!(plan.expirations[0].expired_amount, dec("5.0"));
        assert_eq!(plan.expirations[0].remaining_before, dec("30.0"));
    }

    /// CP-003: buckets whose window closes are expired in full
    #[test]
    fn test_window_expiration_loses_full_remainder() {
        let buckets = vec![bucket(2023, "4.0"), bucket(2024, "6.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("10.0"), dec("40.0"));

        assert_eq!(plan.carried_days, dec("6.0"));
        assert_eq!(plan.expirations.len(), 1);
        assert_eq!(plan.expirations[0].origin_year, 2023);
        assert_eq!(plan.expirations[0].expired_amount, dec("4.0"));
    }

    #[test]
    fn test_cap_and_window_expiration_together() {
        let buckets = vec![bucket(2023, "2.0"), bucket(2024, "30.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("20.0"), dec("40.0"));

        assert_eq!(plan.carried_days, dec("20.0"));
        assert_eq!(plan.expirations.len(), 2);
        assert_eq!(plan.expirations[0].origin_year, 2023);
        assert_eq!(plan.expirations[0].expired_amount, dec("2.0"));
        assert_eq!(plan.expirations[1].origin_year, 2024);
        assert_eq!(plan.expirations[1].expired_amount, dec("10.0"));
    }

    #[test]
    fn test_no_closing_bucket_carries_nothing() {
        let buckets = vec![bucket(2023, "4.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("10.0"), dec("40.0"));

        assert_eq!(plan.carried_days, Decimal::ZERO);
        assert_eq!(plan.from_remaining_before, Decimal::ZERO);
        assert_eq!(plan.expirations.len(), 1);
    }

    #[test]
    fn test_incoming_grant_at_cap_expires_entire_remainder() {
        let buckets = vec![bucket(2024, "12.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("40.0"), dec("40.0"));

        assert_eq!(plan.carried_days, Decimal::ZERO);
        assert_eq!(plan.expirations[0].expired_amount, dec("12.0"));
    }

    #[test]
    fn test_already_expired_buckets_are_ignored() {
        let mut stale = bucket(2023, "4.0");
        stale.expired = true;
        let buckets = vec![stale, bucket(2024, "6.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("10.0"), dec("40.0"));

        assert_eq!(plan.carried_days, dec("6.0"));
        assert!(plan.expirations.is_empty());
    }

    #[test]
    fn test_carried_plus_incoming_never_exceeds_cap() {
        for remaining in ["0.0", "5.0", "25.0", "40.0"] {
            let buckets = vec![bucket(2024, remaining)];
            let plan = plan_carryover(&buckets, 2024, 2025, dec("20.0"), dec("40.0"));
            assert!(plan.carried_days + dec("20.0") <= dec("40.0"));
        }
    }

    #[test]
    fn test_drained_window_bucket_is_still_planned_for_expiry() {
        let buckets = vec![bucket(2023, "0.0"), bucket(2024, "6.0")];

        let plan = plan_carryover(&buckets, 2024, 2025, dec("10.0"), dec("40.0"));

        // The bucket must still be marked expired; the zero amount means
        // no balance is lost and no expiration audit entry is written.
        assert_eq!(plan.expirations.len(), 1);
        assert_eq!(plan.expirations[0].expired_amount, Decimal::ZERO);
    }
}
