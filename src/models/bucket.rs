//! Leave balance buckets.
//!
//! A bucket holds the remaining balance from one fiscal year's grant.
//! Days live for exactly two fiscal years: a bucket granted in
//! `origin_year` is usable during `origin_year` and `origin_year + 1`,
//! and [`LeaveBalanceBucket::expires_at`] names the first fiscal year in
//! which it can no longer be drawn on. At most two buckets are active
//! for an employee at any time: the current-year bucket and the
//! prior-year carryover bucket.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fiscal years a grant remains usable, counting its own.
pub const BUCKET_VALIDITY_YEARS: i32 = 2;

/// A per-employee, per-grant-year balance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalanceBucket {
    /// The employee the bucket belongs to.
    pub employee_id: String,
    /// The fiscal year the days were granted.
    pub origin_year: i32,
    /// The number of days originally granted into this bucket.
    pub granted_days: Decimal,
    /// The number of days still available. Never negative.
    pub remaining_days: Decimal,
    /// The first fiscal year in which the bucket is unusable
    /// (`origin_year + 2`).
    pub expires_at: i32,
    /// Set by year-end processing once the bucket's window has closed.
    pub expired: bool,
}

impl LeaveBalanceBucket {
    /// Creates a fresh bucket for a fiscal-year grant.
    pub fn new(employee_id: &str, origin_year: i32, granted_days: Decimal) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            origin_year,
            granted_days,
            remaining_days: granted_days,
            expires_at: origin_year + BUCKET_VALIDITY_YEARS,
            expired: false,
        }
    }

    /// Returns true if the bucket can be drawn on in the given fiscal year.
    ///
    /// A bucket is active while its window is open, it has not been
    /// marked expired, and it still holds a positive balance.
    pub fn is_active(&self, fiscal_year: i32) -> bool {
        !self.expired
            && fiscal_year >= self.origin_year
            && fiscal_year < self.expires_at
            && self.remaining_days > Decimal::ZERO
    }

    /// Returns true if the bucket's window has closed as of the given
    /// fiscal year, regardless of remaining balance.
    pub fn is_expired_in(&self, fiscal_year: i32) -> bool {
        self.expired || fiscal_year >= self.expires_at
    }
}
