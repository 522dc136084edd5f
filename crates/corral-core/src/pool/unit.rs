//! Execution units: one concurrent instance of a pool's operation

use super::context::{self, UnitContext};
use super::operation::Operation;
use super::types::{Pool, PoolInner};
use crate::error::{CorralError, panic_message};
use crate::router::{FailureRecord, WeakFailureSender};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

/// Lifecycle status of an execution unit within one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    /// Initial state; the only non-terminal one
    Started,
    /// The operation returned successfully
    Finished,
    /// The operation failed, panicked or was aborted
    Error,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "STARTED",
            Self::Finished => "FINISHED",
            Self::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Started)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of a unit's state
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSnapshot {
    pub ordinal: usize,
    pub name: String,
    pub status: UnitStatus,
    pub error: Option<CorralError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct UnitState {
    status: UnitStatus,
    error: Option<CorralError>,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// One concurrent instance of a pool's operation for one run
///
/// Clones share the same state slot. The back-reference to the pool is
/// weak: a unit never keeps its pool alive.
#[derive(Debug, Clone)]
pub(crate) struct ExecutionUnit {
    ordinal: usize,
    name: String,
    pool_name: String,
    pool: Weak<PoolInner>,
    state: Arc<RwLock<UnitState>>,
}

/// Derived unit name, stable across restarts
fn unit_name(pool_name: &str, ordinal: usize) -> String {
    format!("{}-{}", pool_name, ordinal)
}

impl ExecutionUnit {
    pub(crate) fn new(pool: &Pool, ordinal: usize) -> Self {
        Self {
            ordinal,
            name: unit_name(pool.name(), ordinal),
            pool_name: pool.name().to_string(),
            pool: pool.downgrade(),
            state: Arc::new(RwLock::new(UnitState {
                status: UnitStatus::Started,
                error: None,
                started_at: Utc::now(),
                finished_at: None,
            })),
        }
    }

    pub(crate) fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn status(&self) -> UnitStatus {
        self.state.read().status
    }

    pub(crate) fn error(&self) -> Option<CorralError> {
        self.state.read().error.clone()
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        let state = self.state.read();
        UnitSnapshot {
            ordinal: self.ordinal,
            name: self.name.clone(),
            status: state.status,
            error: state.error.clone(),
            started_at: state.started_at,
            finished_at: state.finished_at,
        }
    }

    /// Move to FINISHED. A unit leaves STARTED at most once.
    pub(crate) fn finish(&self) -> bool {
        let mut state = self.state.write();
        if state.status.is_terminal() {
            return false;
        }
        state.status = UnitStatus::Finished;
        state.finished_at = Some(Utc::now());
        true
    }

    /// Move to ERROR and capture the error. A unit leaves STARTED at most once.
    pub(crate) fn fail(&self, error: CorralError) -> bool {
        let mut state = self.state.write();
        if state.status.is_terminal() {
            return false;
        }
        state.status = UnitStatus::Error;
        state.error = Some(error);
        state.finished_at = Some(Utc::now());
        true
    }

    /// Build the failure record for this unit, if its pool still exists
    pub(crate) fn failure_record(&self, run: u64, error: CorralError) -> Option<FailureRecord> {
        let inner = self.pool.upgrade()?;
        Some(FailureRecord {
            pool: Pool::from_inner(inner),
            ordinal: self.ordinal,
            unit: self.name.clone(),
            run,
            error,
        })
    }

    /// Launch the operation in its own task
    ///
    /// The returned handle resolves exactly once, after the unit has
    /// reached a terminal status and any failure record has been pushed.
    pub(crate) fn run(
        &self,
        run: u64,
        operation: Operation,
        failures: WeakFailureSender,
    ) -> JoinHandle<()> {
        let unit = self.clone();
        let identity = UnitContext {
            pool: self.pool_name.clone(),
            ordinal: self.ordinal,
            unit: self.name.clone(),
            run,
        };

        tokio::spawn(async move {
            let result = AssertUnwindSafe(context::scope(identity, async move {
                operation.invoke().await
            }))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(CorralError::panic(panic_message(payload))));

            match result {
                Ok(()) => {
                    unit.finish();
                }
                Err(error) => {
                    tracing::debug!(unit = %unit.name, run, error = %error, "Unit operation failed");
                    if !unit.fail(error.clone()) {
                        return;
                    }
                    let Some(record) = unit.failure_record(run, error) else {
                        return;
                    };
                    if !failures.send(record).await {
                        tracing::info!(
                            unit = %unit.name,
                            run,
                            "Failure not routed, pool is no longer supervised"
                        );
                    }
                }
            }
        })
    }
}
