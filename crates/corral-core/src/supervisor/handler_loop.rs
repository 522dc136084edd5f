//! Handler loop: drains a pool's failure channel into the failure handler

use super::handler::SharedFailureHandler;
use super::types::SupervisionEvent;
use crate::error::{CorralError, panic_message};
use crate::pool::Pool;
use crate::router::FailureReceiver;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Default)]
pub(crate) struct HandlerStats {
    pub routed: u64,
    pub handled: u64,
    pub timeouts: u64,
    pub panics: u64,
    pub last_error: Option<CorralError>,
}

/// Consume failure records until the channel closes.
///
/// Records are handled one at a time in arrival order. Every invocation
/// is spawned and bounded by `watchdog`; on expiry the loop logs, counts
/// and moves on while the invocation keeps running detached.
pub(crate) async fn handle_failures(
    pool: Pool,
    mut failures: FailureReceiver,
    handler: Option<SharedFailureHandler>,
    watchdog: Duration,
    events: broadcast::Sender<SupervisionEvent>,
) -> HandlerStats {
    let mut stats = HandlerStats::default();

    while let Some(record) = failures.recv().await {
        stats.routed += 1;
        stats.last_error = Some(record.error.clone());

        tracing::error!(
            pool = %pool.name(),
            unit = %record.unit,
            run = record.run,
            error = %record.error,
            "Unit failed"
        );
        let _ = events.send(SupervisionEvent::UnitFailed {
            pool: pool.name().to_string(),
            unit: record.unit.clone(),
            run: record.run,
            error: record.error.to_string(),
        });

        let Some(handler) = handler.clone() else {
            continue;
        };

        let unit = record.unit.clone();
        let invocation = tokio::spawn(async move {
            handler.handle(&record.pool, &record.error).await;
        });

        match tokio::time::timeout(watchdog, invocation).await {
            Ok(Ok(())) => stats.handled += 1,
            Ok(Err(join_error)) => {
                let message = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    join_error.to_string()
                };
                stats.panics += 1;
                tracing::warn!(pool = %pool.name(), unit = %unit, %message, "Failure handler panicked");
                let _ = events.send(SupervisionEvent::HandlerPanicked {
                    pool: pool.name().to_string(),
                    unit,
                    message,
                });
            }
            Err(_) => {
                stats.timeouts += 1;
                tracing::warn!(
                    pool = %pool.name(),
                    unit = %unit,
                    ?watchdog,
                    "Failure handler timed out"
                );
                let _ = events.send(SupervisionEvent::HandlerTimedOut {
                    pool: pool.name().to_string(),
                    unit,
                });
            }
        }
    }

    tracing::debug!(pool = %pool.name(), routed = stats.routed, "Failure channel closed");
    stats
}
