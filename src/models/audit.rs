//! Audit log entries.
//!
//! Every balance-affecting operation appends [`AuditEntry`] rows in the
//! same atomic unit of work as the state change it describes. Entries
//! are never updated or deleted, and the sequence is sufficient on its
//! own to regenerate a statutory leave ledger for any past year.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of balance-affecting action an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A fiscal-year entitlement was granted.
    Grant,
    /// Days were deducted for self-scheduled leave.
    Deduction,
    /// Unused balance was carried across a fiscal-year boundary.
    Carryover,
    /// Balance was permanently lost at the end of its window or to the
    /// carryover cap.
    Expiration,
    /// Days were deducted by employer designation.
    Designate,
    /// A previous deduction was restored.
    Revert,
}

/// One append-only row in the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier for this entry.
    pub id: Uuid,
    /// The action being recorded.
    pub action: AuditAction,
    /// The employee whose balance changed.
    pub employee_id: String,
    /// The origin year of the bucket the action touched.
    pub affected_year: i32,
    /// The magnitude of the change, always non-negative.
    pub amount: Decimal,
    /// The bucket's remaining balance before the change.
    pub balance_before: Decimal,
    /// The bucket's remaining balance after the change.
    pub balance_after: Decimal,
    /// Who performed the action (system actor for batch jobs).
    pub actor: String,
    /// Human-readable explanation, including any substitution made
    /// during a revert.
    pub reason: String,
    /// When the entry was committed.
    pub timestamp: DateTime<Utc>,
}
