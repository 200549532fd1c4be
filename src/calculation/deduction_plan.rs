//! LIFO deduction planning.
//!
//! This module computes how a requested deduction is spread across an
//! employee's active buckets, newest grant year first. Planning is pure:
//! it never mutates a bucket, so a plan that fails leaves nothing to
//! roll back.
//!
//! Deduction order is newest grant year first, even though that
//! consumes the balance closest to expiry last.

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{BucketAllocation, LeaveBalanceBucket};

/// The planned spread of one deduction across buckets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeductionPlan {
    /// Ordered (newest bucket first) list of slices to apply.
    pub allocations: Vec<BucketAllocation>,
    /// Total balance available across active buckets before the
    /// deduction.
    pub available: Decimal,
}

/// Validates that a day amount is usable by the ledger.
///
/// Amounts must be strictly positive and expressed to at most one
/// decimal place (half-day granularity).
pub fn validate_day_amount(field: &str, amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput {
            field: field.to_string(),
            message: format!("must be strictly positive, got {}", amount),
        });
    }
    if amount.normalize().scale() > 1 {
        return Err(LedgerError::InvalidInput {
            field: field.to_string(),
            message: format!("must have at most one decimal place, got {}", amount),
        });
    }
    Ok(())
}

/// Plans a deduction across the employee's buckets, newest first.
///
/// # Arguments
///
/// * `buckets` - All buckets for one employee (any order, any state)
/// * `amount` - The number of days to deduct (validated)
/// * `as_of_year` - The fiscal year the deduction takes effect in
///
/// # Returns
///
/// Returns the ordered allocation list, or `InsufficientBalance` with
/// the exact shortfall when the active buckets cannot cover the amount.
/// No bucket is modified either way.
pub fn plan_deduction(
    buckets: &[LeaveBalanceBucket],
    amount: Decimal,
    as_of_year: i32,
) -> LedgerResult<DeductionPlan> {
    validate_day_amount("amount", amount)?;

    let mut active: Vec<&LeaveBalanceBucket> = buckets
        .iter()
        .filter(|b| b.is_active(as_of_year))
        .collect();
    active.sort_by(|a, b| b.origin_year.cmp(&a.origin_year));

    let available: Decimal = active.iter().map(|b| b.remaining_days).sum();
    if available < amount {
        return Err(LedgerError::InsufficientBalance {
            requested: amount,
            available,
            shortfall: amount - available,
        });
    }

    let mut allocations = Vec::new();
    let mut needed = amount;
    for bucket in active {
        if needed == Decimal::ZERO {
            break;
        }
        let take = bucket.remaining_days.min(needed);
        allocations.push(BucketAllocation {
            origin_year: bucket.origin_year,
            amount: take,
        });
        needed -= take;
    }

    Ok(DeductionPlan {
        allocations,
        available,
    })
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

    /// DP-001: newest bucket is drained before the older one
    #[test]
    fn test_lifo_ordering_across_two_buckets() {
        let buckets = vec![bucket(2024, "8.0"), bucket(2025, "3.0")];

        let plan = plan_deduction(&buckets, dec("5.0"), 2025).unwrap();

        assert_eq!(
            plan.allocations,
            vec![
                BucketAllocation {
                    origin_year: 2025,
                    amount: dec("3.0"),
                },
                BucketAllocation {
                    origin_year: 2024,
                    amount: dec("2.0"),
                },
            ]
        );
        assert_eq!(plan.available, dec("11.0"));
    }

    #[test]
    fn test_deduction_covered_by_newest_bucket_alone() {
        let buckets = vec![bucket(2024, "8.0"), bucket(2025, "3.0")];

        let plan = plan_deduction(&buckets, dec("2.0"), 2025).unwrap();

        assert_eq!(plan.allocations.len(), 1);
        assert_eq!(plan.allocations[0].origin_year, 2025);
        assert_eq!(plan.allocations[0].amount, dec("2.0"));
    }

    /// DP-002: shortfall is reported exactly and nothing is planned
    #[test]
    fn test_insufficient_balance_reports_shortfall() {
        let buckets = vec![bucket(2025, "2.0")];

        let result = plan_deduction(&buckets, dec("3.0"), 2025);

        match result.unwrap_err() {
            LedgerError::InsufficientBalance {
                requested,
                available,
                shortfall,
            } => {
                assert_eq!(requested, dec("3.0"));
                assert_eq!(available, dec("2.0"));
                assert_eq!(shortfall, dec("1.0"));
            }
            other => panic!("Expected InsufficientBalance, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_bucket_is_not_drawn_on() {
        let mut old = bucket(2023, "10.0");
        old.expired = true;
        let buckets = vec![old, bucket(2025, "3.0")];

        let result = plan_deduction(&buckets, dec("5.0"), 2025);
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_window_bucket_is_not_drawn_on() {
        // Origin 2023 expires at the start of fiscal 2025
        let buckets = vec![bucket(2023, "10.0"), bucket(2025, "3.0")];

        let result = plan_deduction(&buckets, dec("5.0"), 2025);

        match result.unwrap_err() {
            LedgerError::InsufficientBalance { available, .. } => {
                assert_eq!(available, dec("3.0"));
            }
            other => panic!("Expected InsufficientBalance, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_balance_is_deductible() {
        let buckets = vec![bucket(2024, "2.0"), bucket(2025, "3.0")];

        let plan = plan_deduction(&buckets, dec("5.0"), 2025).unwrap();

        let total: Decimal = plan.allocations.iter().map(|a| a.amount).sum();
        assert_eq!(total, dec("5.0"));
    }

    #[test]
    fn test_half_day_deduction_is_allowed() {
        let buckets = vec![bucket(2025, "3.0")];

        let plan = plan_deduction(&buckets, dec("0.5"), 2025).unwrap();
        assert_eq!(plan.allocations[0].amount, dec("0.5"));
    }

    #[test]
    fn test_zero_amount_is_rejected() {
        let buckets = vec![bucket(2025, "3.0")];

        let result = plan_deduction(&buckets, Decimal::ZERO, 2025);
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let buckets = vec![bucket(2025, "3.0")];

        let result = plan_deduction(&buckets, dec("-1.0"), 2025);
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_sub_half_day_precision_is_rejected() {
        let buckets = vec![bucket(2025, "3.0")];

        let result = plan_deduction(&buckets, dec("0.25"), 2025);
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_trailing_zero_scale_is_accepted() {
        // 1.50 normalizes to 1.5 and is within one-decimal granularity
        assert!(validate_day_amount("amount", dec("1.50")).is_ok());
    }

    #[test]
    fn test_conservation_of_planned_amounts() {
        let buckets = vec![bucket(2024, "7.5"), bucket(2025, "1.5")];

        for request in ["0.5", "1.5", "2.0", "9.0"] {
            let plan = plan_deduction(&buckets, dec(request), 2025).unwrap();
            let total: Decimal = plan.allocations.iter().map(|a| a.amount).sum();
            assert_eq!(total, dec(request));
        }
    }
}
