//! Per-run outcome reporting

use crate::error::CorralError;
use chrono::{DateTime, Utc};

/// How the pool stopped waiting on one unit
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// The operation returned successfully
    Finished,
    /// The operation returned an error or panicked
    Failed(CorralError),
    /// The wait bound fired first; the operation is still running
    WaitExpired,
    /// The wait bound fired first and the unit was aborted
    Aborted(CorralError),
}

impl UnitOutcome {
    pub fn error(&self) -> Option<&CorralError> {
        match self {
            Self::Failed(error) | Self::Aborted(error) => Some(error),
            Self::Finished | Self::WaitExpired => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Failed(_) => "failed",
            Self::WaitExpired => "wait_expired",
            Self::Aborted(_) => "aborted",
        }
    }
}

/// Outcome of one unit within a run
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub ordinal: usize,
    pub name: String,
    pub outcome: UnitOutcome,
}

/// Result of one [`Pool::run`](crate::Pool::run)
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Run number (1-based) within the pool's lifetime
    pub run: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Units in ordinal order
    pub units: Vec<UnitReport>,
}

impl RunReport {
    /// Units whose operation failed or was aborted
    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| u.outcome.error().is_some())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Units the pool stopped waiting on while they kept running
    pub fn detached_count(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::WaitExpired))
            .count()
    }

    /// Every unit finished successfully
    pub fn is_clean(&self) -> bool {
        self.units
            .iter()
            .all(|u| matches!(u.outcome, UnitOutcome::Finished))
    }
}
