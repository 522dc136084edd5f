//! Restart loop: runs a pool until its policy or a shutdown stops it

use super::types::{StopReason, SupervisionEvent};
use crate::backoff::ExponentialBackoff;
use crate::pool::{Pool, UnitOutcome};
use crate::router::FailureSender;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Counters collected by one restart loop
#[derive(Debug, Clone)]
pub(crate) struct RestartStats {
    pub runs: u64,
    pub unit_failures: u64,
    pub detached_units: u64,
    pub stop: StopReason,
}

/// Run `pool` repeatedly according to its restart policy.
///
/// Owns the pool's only strong [`FailureSender`]; it is dropped on return,
/// which closes the failure channel and lets the handler loop finish once
/// the buffered records are drained. Cancellation is observed between runs
/// and during backoff sleeps, never while a run is in flight.
pub(crate) async fn run_pool(
    pool: Pool,
    failures: FailureSender,
    cancel_token: CancellationToken,
    events: broadcast::Sender<SupervisionEvent>,
) -> RestartStats {
    let name = pool.name().to_string();
    let policy = pool.config().restart.clone();
    let mut backoff = policy.backoff().cloned().map(ExponentialBackoff::with_config);
    let mut stats = RestartStats {
        runs: 0,
        unit_failures: 0,
        detached_units: 0,
        stop: StopReason::Completed,
    };

    tracing::info!(pool = %name, concurrency = pool.concurrency(), "Pool started");
    let _ = events.send(SupervisionEvent::PoolStarted { pool: name.clone() });

    let stop = loop {
        if cancel_token.is_cancelled() {
            break StopReason::Shutdown;
        }

        let report = pool.run(&failures).await;
        stats.runs += 1;
        stats.unit_failures += report.failure_count() as u64;
        stats.detached_units += report.detached_count() as u64;

        for unit in &report.units {
            if unit.outcome == UnitOutcome::WaitExpired {
                let _ = events.send(SupervisionEvent::UnitWaitExpired {
                    pool: name.clone(),
                    unit: unit.name.clone(),
                    run: report.run,
                });
            }
        }
        let _ = events.send(SupervisionEvent::RunCompleted {
            pool: name.clone(),
            run: report.run,
            failures: report.failure_count(),
            detached: report.detached_count(),
        });

        if !policy.restarts() {
            break StopReason::Completed;
        }
        if !policy.should_restart(pool.restarts()) {
            tracing::warn!(
                pool = %name,
                restarts = pool.restarts(),
                "Restart limit reached"
            );
            break StopReason::RestartLimit;
        }
        if cancel_token.is_cancelled() {
            break StopReason::Shutdown;
        }

        let restarts = pool.record_restart();
        tracing::info!(pool = %name, restarts, "Restarting pool");
        let _ = events.send(SupervisionEvent::PoolRestarted {
            pool: name.clone(),
            restarts,
        });

        if let Some(backoff) = backoff.as_mut() {
            if report.is_clean() {
                backoff.reset();
            }
            let delay = backoff.next_delay();
            tracing::debug!(pool = %name, ?delay, "Backing off before restart");

            tokio::select! {
                _ = cancel_token.cancelled() => break StopReason::Shutdown,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    };

    pool.mark_finished();
    drop(failures);

    tracing::info!(
        pool = %name,
        runs = stats.runs,
        restarts = pool.restarts(),
        reason = %stop,
        "Pool stopped"
    );
    let _ = events.send(SupervisionEvent::PoolStopped {
        pool: name,
        reason: stop.clone(),
    });

    stats.stop = stop;
    stats
}
