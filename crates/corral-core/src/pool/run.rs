//! One run of a pool: launch every unit, wait for all of them

use super::bound::WaitBound;
use super::report::{RunReport, UnitOutcome, UnitReport};
use super::types::Pool;
use super::unit::{ExecutionUnit, UnitStatus};
use crate::config::BoundMode;
use crate::error::CorralError;
use crate::router::FailureSender;
use chrono::Utc;
use futures::future::join_all;
use tokio::task::{JoinError, JoinHandle};

impl Pool {
    /// Execute one run
    ///
    /// Creates `concurrency` fresh units, launches them concurrently and
    /// returns once every unit has completed or had its wait bound fire.
    /// Failures are pushed onto `failures` and recorded on the units; they
    /// are never returned as an error from this method.
    pub async fn run(&self, failures: &FailureSender) -> RunReport {
        let started_at = Utc::now();
        let run = self.begin_run(started_at);
        let bound = WaitBound::from_config(self.config(), started_at);

        let units: Vec<ExecutionUnit> = (1..=self.concurrency())
            .map(|ordinal| ExecutionUnit::new(self, ordinal))
            .collect();
        self.install_units(units.clone());

        tracing::info!(
            pool = %self.name(),
            run,
            concurrency = units.len(),
            bound = bound.kind(),
            "Pool run started"
        );

        let weak_failures = failures.downgrade();
        let waits = units.into_iter().map(|unit| {
            let handle = unit.run(run, self.operation().clone(), weak_failures.clone());
            self.wait_for_unit(unit, handle, bound, run, failures)
        });
        let reports = join_all(waits).await;

        let report = RunReport {
            run,
            started_at,
            finished_at: Utc::now(),
            units: reports,
        };

        tracing::info!(
            pool = %self.name(),
            run,
            failures = report.failure_count(),
            detached = report.detached_count(),
            "Pool run finished"
        );

        report
    }

    /// Race one unit's completion against the run's wait bound
    async fn wait_for_unit(
        &self,
        unit: ExecutionUnit,
        mut handle: JoinHandle<()>,
        bound: WaitBound,
        run: u64,
        failures: &FailureSender,
    ) -> UnitReport {
        let completed = match bound.expires_at() {
            None => Some((&mut handle).await),
            Some(at) => tokio::select! {
                biased;
                result = &mut handle => Some(result),
                _ = tokio::time::sleep_until(at) => None,
            },
        };

        let outcome = match completed {
            Some(Ok(())) => settled_outcome(&unit),
            Some(Err(join_error)) => self.unit_task_lost(&unit, join_error, run, failures).await,
            None => match self.config().bound_mode {
                BoundMode::WaitOnly => {
                    // Dropping the handle detaches the task; it keeps running.
                    drop(handle);
                    tracing::warn!(
                        unit = %unit.name(),
                        run,
                        bound = bound.kind(),
                        "Unit wait bound expired, operation continues in background"
                    );
                    UnitOutcome::WaitExpired
                }
                BoundMode::Abort => {
                    handle.abort();
                    match handle.await {
                        Ok(()) => settled_outcome(&unit),
                        Err(join_error) if join_error.is_cancelled() => {
                            let error = CorralError::timeout(bound.span().unwrap_or_default());
                            tracing::warn!(
                                unit = %unit.name(),
                                run,
                                bound = bound.kind(),
                                "Unit wait bound expired, unit aborted"
                            );
                            if unit.fail(error.clone()) {
                                self.route(&unit, run, error.clone(), failures).await;
                                UnitOutcome::Aborted(error)
                            } else {
                                // Aborted while pushing its own failure; the
                                // send did not complete.
                                let outcome = settled_outcome(&unit);
                                if let Some(error) = outcome.error() {
                                    self.route(&unit, run, error.clone(), failures).await;
                                }
                                outcome
                            }
                        }
                        Err(join_error) => {
                            self.unit_task_lost(&unit, join_error, run, failures).await
                        }
                    }
                }
            },
        };

        match &outcome {
            UnitOutcome::Finished => {
                tracing::debug!(unit = %unit.name(), run, "Unit finished");
            }
            UnitOutcome::Failed(error) => {
                tracing::info!(unit = %unit.name(), run, error = %error, "Unit finished with error");
            }
            UnitOutcome::WaitExpired | UnitOutcome::Aborted(_) => {}
        }

        UnitReport {
            ordinal: unit.ordinal(),
            name: unit.name().to_string(),
            outcome,
        }
    }

    /// The unit task ended without settling the unit (runtime shutdown or a
    /// panic outside the operation)
    async fn unit_task_lost(
        &self,
        unit: &ExecutionUnit,
        join_error: JoinError,
        run: u64,
        failures: &FailureSender,
    ) -> UnitOutcome {
        let error = CorralError::from(join_error);
        if unit.fail(error.clone()) {
            self.route(unit, run, error.clone(), failures).await;
        }
        settled_outcome(unit)
    }

    async fn route(&self, unit: &ExecutionUnit, run: u64, error: CorralError, failures: &FailureSender) {
        if let Some(record) = unit.failure_record(run, error) {
            if !failures.send(record).await {
                tracing::debug!(unit = %unit.name(), run, "Failure channel closed");
            }
        }
    }
}

/// Outcome read back from a unit that has left STARTED
fn settled_outcome(unit: &ExecutionUnit) -> UnitOutcome {
    match unit.status() {
        UnitStatus::Finished => UnitOutcome::Finished,
        UnitStatus::Error => UnitOutcome::Failed(
            unit.error()
                .unwrap_or_else(|| CorralError::other("unit failed without an error")),
        ),
        UnitStatus::Started => UnitOutcome::WaitExpired,
    }
}
