//! Notification boundary.
//!
//! The ledger does not deliver notifications itself; it emits
//! [`ComplianceEvent`]s through a [`NotificationSink`] and an external
//! service handles delivery. The default sink drops events; a recording
//! sink ships for tests and for batching.

use std::sync::Mutex;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An event the compliance tracker or year-end processor wants a human
/// to hear about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ComplianceEvent {
    /// Balance will expire at the upcoming fiscal-year boundary.
    ExpiringSoon {
        /// The employee holding the expiring balance.
        employee_id: String,
        /// The number of days at risk of expiring.
        amount: Decimal,
        /// Calendar days until the boundary.
        days_left: i64,
    },
    /// The minimum-usage obligation is unmet.
    NonCompliant {
        /// The employee failing the obligation.
        employee_id: String,
        /// Days still required to meet it.
        shortfall: Decimal,
    },
    /// Balance was permanently lost at a fiscal-year boundary.
    DaysExpired {
        /// The employee whose balance expired.
        employee_id: String,
        /// The number of days lost.
        amount: Decimal,
    },
}

/// Receives compliance events for external delivery.
pub trait NotificationSink: Send + Sync {
    /// Accepts one event. Implementations must not block the ledger.
    fn notify(&self, event: ComplianceEvent);
}

/// A sink that drops every event. The default when no delivery service
/// is wired up.
#[derive(Debug, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: ComplianceEvent) {}
}

/// A sink that records every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ComplianceEvent>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every event received so far.
    pub fn events(&self) -> Vec<ComplianceEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    /// Removes and returns every event received so far.
    pub fn drain(&self) -> Vec<ComplianceEvent> {
        std::mem::take(&mut *self.events.lock().expect("sink lock poisoned"))
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, event: ComplianceEvent) {
        self.events.lock().expect("sink lock poisoned").push(event);
    }
}
