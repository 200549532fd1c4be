//! Core data models for the leave balance ledger.
//!
//! This module contains all the domain records used throughout the ledger.

mod audit;
mod bucket;
mod employee;
mod grant;
mod usage;

pub use audit::{AuditAction, AuditEntry};
pub use bucket::{BUCKET_VALIDITY_YEARS, LeaveBalanceBucket};
pub use employee::{EmployeeProfile, EmploymentStatus};
pub use grant::FiscalYearGrant;
pub use usage::{BucketAllocation, UsageKind, UsageRecord};
