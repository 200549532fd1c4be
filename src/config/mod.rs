//! Policy configuration for the leave balance ledger.
//!
//! The ledger's statutory parameters (fiscal calendar, the seniority
//! step table, carryover cap, compliance thresholds) are loaded from
//! YAML files rather than hard-coded, so a deployment can track
//! regulatory revisions without a code change.

mod loader;
mod types;

pub use loader::PolicyLoader;
pub use types::{
    BalanceRules, ComplianceRules, FiscalCalendar, GrantStep, GrantTable, LeavePolicy,
    LockingRules, PolicyFile, PolicyMetadata,
};
