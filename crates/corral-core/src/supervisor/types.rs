//! Types for pool supervision

use crate::error::{CorralError, CorralResult};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Why a pool's restart loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The restart policy is `Never` and the single run completed
    Completed,
    /// An `Always` policy reached its `max_restarts`
    RestartLimit,
    /// The supervisor was shut down
    Shutdown,
    /// The restart loop task itself died
    Crashed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::RestartLimit => f.write_str("restart limit reached"),
            Self::Shutdown => f.write_str("shutdown"),
            Self::Crashed(message) => write!(f, "crashed: {}", message),
        }
    }
}

/// Events emitted by the supervisor
#[derive(Debug, Clone)]
pub enum SupervisionEvent {
    /// A pool's restart loop started
    PoolStarted { pool: String },
    /// One run of a pool cleared its barrier
    RunCompleted {
        pool: String,
        run: u64,
        failures: usize,
        detached: usize,
    },
    /// The pool stopped waiting on a unit that is still running
    UnitWaitExpired { pool: String, unit: String, run: u64 },
    /// A failure record reached the handler loop
    UnitFailed {
        pool: String,
        unit: String,
        run: u64,
        error: String,
    },
    /// A pool is about to begin another run
    PoolRestarted { pool: String, restarts: u64 },
    /// A pool's restart loop ended
    PoolStopped { pool: String, reason: StopReason },
    /// A handler invocation outlived the watchdog
    HandlerTimedOut { pool: String, unit: String },
    /// A handler invocation panicked
    HandlerPanicked {
        pool: String,
        unit: String,
        message: String,
    },
    /// Supervisor shutting down
    ShuttingDown,
}

/// Per-pool result of a supervision
#[derive(Debug, Clone, PartialEq)]
pub struct PoolOutcome {
    pub pool_id: Uuid,
    pub name: String,
    /// Runs started
    pub runs: u64,
    /// Restarts performed
    pub restarts: u64,
    /// Units that failed or were aborted, as seen by the run barrier
    pub unit_failures: u64,
    /// Units the pool stopped waiting on while they kept running
    pub detached_units: u64,
    /// Failure records delivered to the handler loop
    pub failures_routed: u64,
    /// Handler invocations that completed within the watchdog
    pub handled: u64,
    pub handler_timeouts: u64,
    pub handler_panics: u64,
    /// Most recent routed failure
    pub last_error: Option<CorralError>,
    pub stop: StopReason,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl PoolOutcome {
    /// No unit failed, nothing was routed and the loop did not crash
    pub fn is_success(&self) -> bool {
        self.unit_failures == 0
            && self.failures_routed == 0
            && !matches!(self.stop, StopReason::Crashed(_))
    }
}

/// Result of [`Supervisor::run_all`](super::Supervisor::run_all)
///
/// Unit failures never make supervision itself fail; they are reported
/// here, per pool, in the order the pools were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupervisionReport {
    pub pools: Vec<PoolOutcome>,
}

impl SupervisionReport {
    pub fn is_success(&self) -> bool {
        self.pools.iter().all(PoolOutcome::is_success)
    }

    pub fn failed_pools(&self) -> impl Iterator<Item = &PoolOutcome> {
        self.pools.iter().filter(|p| !p.is_success())
    }

    /// Outcome of the first pool with the given name
    pub fn pool(&self, name: &str) -> Option<&PoolOutcome> {
        self.pools.iter().find(|p| p.name == name)
    }

    pub fn total_failures(&self) -> u64 {
        self.pools.iter().map(|p| p.unit_failures).sum()
    }

    pub fn handler_timeouts(&self) -> u64 {
        self.pools.iter().map(|p| p.handler_timeouts).sum()
    }

    /// Turn any pool failure into a [`CorralError::Supervision`]
    pub fn into_result(self) -> CorralResult<Self> {
        let failed: Vec<String> = self.failed_pools().map(|p| p.name.clone()).collect();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(CorralError::supervision(failed))
        }
    }
}
