//! Supervisor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default watchdog bound on one failure-handler invocation (10 seconds)
pub const HANDLER_WATCHDOG_SECS: u64 = 10;

/// Default capacity of the supervision event channel
pub const EVENT_CAPACITY: usize = 256;

/// Supervisor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// How long the handler loop waits for one handler invocation
    #[serde(with = "humantime_serde")]
    pub watchdog: Duration,
    /// Buffered events per subscriber before it starts lagging
    pub event_capacity: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            watchdog: Duration::from_secs(HANDLER_WATCHDOG_SECS),
            event_capacity: EVENT_CAPACITY,
        }
    }
}

impl SupervisorConfig {
    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.watchdog = watchdog;
        self
    }

    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity;
        self
    }
}
