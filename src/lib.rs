//! Fiscal-Year Leave Balance Ledger
//!
//! This crate tracks statutory paid-leave entitlement under a
//! seniority-graduated regime (Labor Standards Act Art. 39): it computes
//! fiscal-year grants, applies deductions newest-bucket-first, rolls
//! unused balance across year boundaries under the 40-day cap, tracks
//! the 5-of-10 minimum-usage obligation, and mirrors every mutation
//! into an append-only audit log that can regenerate the statutory
//! leave ledger document for any past year.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod models;
pub mod notifications;
pub mod report;
