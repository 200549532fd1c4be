//! Error types for the leave balance ledger.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for all error conditions that can occur while operating the ledger.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the leave balance ledger.
///
/// All operations in the ledger return this error type, making it easy
/// to handle errors consistently throughout the application. Callers can
/// use [`LedgerError::is_retryable`] to distinguish transient lock
/// contention from definitive rejections.
///
/// # Example
///
/// ```
/// use leave_ledger::error::LedgerError;
///
/// let error = LedgerError::UnknownEmployee {
///     employee_id: "emp_404".to_string(),
/// };
/// assert_eq!(error.to_string(), "Unknown employee: emp_404");
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    /// An input failed validation before any state was touched.
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput {
        /// The input field that failed validation.
        field: String,
        /// A description of what made the input invalid.
        message: String,
    },

    /// The employee could not be resolved through the employee directory.
    #[error("Unknown employee: {employee_id}")]
    UnknownEmployee {
        /// The employee identifier that did not resolve.
        employee_id: String,
    },

    /// A deduction asked for more days than the employee has available.
    ///
    /// The operation is rejected atomically; no bucket is touched.
    #[error("Insufficient balance: requested {requested}, available {available} (short {shortfall})")]
    InsufficientBalance {
        /// The number of days requested.
        requested: Decimal,
        /// The number of days available across all active buckets.
        available: Decimal,
        /// The difference between requested and available.
        shortfall: Decimal,
    },

    /// A fiscal-year grant already exists for this employee and year.
    #[error("Grant already issued for employee {employee_id} in fiscal year {year}")]
    AlreadyGranted {
        /// The employee the duplicate grant was attempted for.
        employee_id: String,
        /// The fiscal year of the duplicate grant.
        year: i32,
    },

    /// The year-end carryover has already run for this year pair.
    #[error("Carryover already processed for {from_year} -> {to_year}")]
    AlreadyProcessed {
        /// The fiscal year being closed.
        from_year: i32,
        /// The fiscal year being opened.
        to_year: i32,
    },

    /// A designation was requested for an employee who already meets the
    /// minimum-usage obligation.
    #[error("Employee {employee_id} is already compliant for {year} ({used} days used)")]
    AlreadyCompliant {
        /// The employee the designation was attempted for.
        employee_id: String,
        /// The fiscal year of the attempted designation.
        year: i32,
        /// The days already used in that fiscal year.
        used: Decimal,
    },

    /// The usage record has already been reverted once.
    #[error("Usage record {usage_record_id} has already been reverted")]
    AlreadyReverted {
        /// The id of the usage record.
        usage_record_id: Uuid,
    },

    /// No usage record exists with the given id.
    #[error("Usage record not found: {usage_record_id}")]
    UsageRecordNotFound {
        /// The id that did not resolve.
        usage_record_id: Uuid,
    },

    /// The per-employee lock could not be acquired within the bounded
    /// timeout. Retryable: callers are expected to retry with backoff.
    #[error("Employee {employee_id} is locked by another operation; retry later")]
    Busy {
        /// The employee whose lock timed out.
        employee_id: String,
    },

    /// Stored state violates a ledger invariant (negative balance, cap
    /// exceeded outside a carryover window). Fatal for the employee:
    /// further writes are quarantined until the data is repaired.
    #[error("Data integrity violation for employee {employee_id}: {message}")]
    DataIntegrityViolation {
        /// The employee whose state is inconsistent.
        employee_id: String,
        /// A description of the violated invariant.
        message: String,
    },

    /// Policy configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Policy configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },
}

impl LedgerError {
    /// Returns true if the operation may succeed when retried.
    ///
    /// Only lock contention is retryable; every other error is a
    /// definitive rejection of the request as submitted.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Busy { .. })
    }
}

/// A type alias for Results that return LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
