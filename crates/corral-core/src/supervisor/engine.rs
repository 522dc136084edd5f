//! Supervisor running many pools concurrently

use super::handler::SharedFailureHandler;
use super::handler_loop::{HandlerStats, handle_failures};
use super::restart_loop::{RestartStats, run_pool};
use super::types::{PoolOutcome, StopReason, SupervisionEvent, SupervisionReport};
use crate::config::SupervisorConfig;
use crate::error::CorralError;
use crate::pool::Pool;
use crate::router::failure_channel;
use futures::future::join_all;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Supervisor for a set of pools
///
/// For every pool, [`run_all`](Self::run_all) starts a restart loop and a
/// handler loop connected by the pool's failure channel, then waits until
/// every restart loop has stopped and every failure has been handled.
pub struct Supervisor {
    config: SupervisorConfig,
    /// Cancellation token shared by all restart loops
    cancel_token: CancellationToken,
    /// Event channel for supervision events
    events: broadcast::Sender<SupervisionEvent>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::with_config(SupervisorConfig::default())
    }

    pub fn with_config(config: SupervisorConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            cancel_token: CancellationToken::new(),
            events,
        }
    }

    /// Set how long one handler invocation may run before it is abandoned
    pub fn with_watchdog(mut self, watchdog: Duration) -> Self {
        self.config.watchdog = watchdog;
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = token;
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Get an event subscriber
    pub fn subscribe(&self) -> broadcast::Receiver<SupervisionEvent> {
        self.events.subscribe()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Stop every restart loop after its current run
    pub fn shutdown(&self) {
        tracing::info!("Supervisor shutting down");
        let _ = self.events.send(SupervisionEvent::ShuttingDown);
        self.cancel_token.cancel();
    }

    /// Supervise `pools` until all of them have stopped.
    ///
    /// With `Never` restart policies this returns once every pool has run
    /// once and every failure has been passed to `handler`. With an
    /// unlimited `Always` policy it returns only after [`shutdown`](Self::shutdown).
    /// Unit failures are reported in the result, never raised.
    pub async fn run_all(
        &self,
        pools: impl IntoIterator<Item = Pool>,
        handler: Option<SharedFailureHandler>,
    ) -> SupervisionReport {
        let pools: Vec<Pool> = pools.into_iter().collect();
        tracing::info!(
            pools = pools.len(),
            watchdog = ?self.config.watchdog,
            "Supervision started"
        );

        let supervised = pools.into_iter().map(|pool| {
            let (tx, rx) = failure_channel(pool.concurrency());
            let restart = tokio::spawn(run_pool(
                pool.clone(),
                tx,
                self.cancel_token.child_token(),
                self.events.clone(),
            ));
            let handling = tokio::spawn(handle_failures(
                pool.clone(),
                rx,
                handler.clone(),
                self.config.watchdog,
                self.events.clone(),
            ));

            async move {
                let (restart, handling) = tokio::join!(restart, handling);
                outcome(&pool, restart, handling)
            }
        });

        let report = SupervisionReport {
            pools: join_all(supervised).await,
        };

        if report.is_success() {
            tracing::info!(pools = report.pools.len(), "Supervision finished");
        } else {
            tracing::warn!(
                pools = report.pools.len(),
                failed = report.failed_pools().count(),
                unit_failures = report.total_failures(),
                "Supervision finished with failures"
            );
        }
        report
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Supervise `pools` with a default [`Supervisor`]
pub async fn run_pools(
    pools: impl IntoIterator<Item = Pool>,
    handler: Option<SharedFailureHandler>,
) -> SupervisionReport {
    Supervisor::new().run_all(pools, handler).await
}

fn outcome(
    pool: &Pool,
    restart: Result<RestartStats, tokio::task::JoinError>,
    handling: Result<HandlerStats, tokio::task::JoinError>,
) -> PoolOutcome {
    let restart = restart.unwrap_or_else(|e| {
        let error = CorralError::from(e);
        tracing::error!(pool = %pool.name(), %error, "Restart loop crashed");
        pool.mark_finished();
        RestartStats {
            runs: pool.runs(),
            unit_failures: 0,
            detached_units: 0,
            stop: StopReason::Crashed(error.to_string()),
        }
    });
    let handling = handling.unwrap_or_else(|e| {
        tracing::error!(pool = %pool.name(), error = %e, "Handler loop crashed");
        HandlerStats::default()
    });

    PoolOutcome {
        pool_id: pool.id(),
        name: pool.name().to_string(),
        runs: restart.runs,
        restarts: pool.restarts(),
        unit_failures: restart.unit_failures,
        detached_units: restart.detached_units,
        failures_routed: handling.routed,
        handled: handling.handled,
        handler_timeouts: handling.timeouts,
        handler_panics: handling.panics,
        last_error: handling.last_error,
        stop: restart.stop,
        started_at: pool.started_at(),
        finished_at: pool.finished_at(),
    }
}
