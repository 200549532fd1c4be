//! Usage records.
//!
//! A [`UsageRecord`] is created once per approved leave request (or per
//! employer-designated date) and records exactly which buckets the days
//! were drawn from, in order. The allocation list is what makes a
//! deduction reversible: revert restores the recorded amounts to the
//! recorded buckets.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Distinguishes self-scheduled leave from employer-designated leave.
///
/// Compliance reporting needs the split: designated days count toward
/// the minimum-usage obligation but are flagged separately in the
/// statutory ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    /// Leave requested and scheduled by the employee.
    SelfScheduled,
    /// Leave scheduled by the employer to satisfy the minimum-usage
    /// obligation.
    Designated,
}

/// One slice of a deduction, taken from a single bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAllocation {
    /// The origin year of the bucket the days were taken from.
    pub origin_year: i32,
    /// The number of days taken from that bucket.
    pub amount: Decimal,
}

/// An immutable record of one balance deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Unique identifier for this record.
    pub id: Uuid,
    /// The employee the days were deducted from.
    pub employee_id: String,
    /// The calendar date the leave is taken on.
    pub use_date: NaiveDate,
    /// Total days deducted (equals the sum of the allocations).
    pub days_deducted: Decimal,
    /// Ordered list of (bucket, amount) slices, newest bucket first.
    pub allocations: Vec<BucketAllocation>,
    /// Whether the leave was self-scheduled or employer-designated.
    pub kind: UsageKind,
    /// Set exactly once if the deduction is later reverted.
    #[serde(default)]
    pub reverted: bool,
}

impl UsageRecord {
    /// Returns the sum of the allocation amounts.
    pub fn allocated_total(&self) -> Decimal {
        self.allocations.iter().map(|a| a.amount).sum()
    }
}
