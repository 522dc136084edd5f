//! Supervision integration tests
//!
//! Drives pools through the public API only.

use corral_core::config::options;
use corral_core::{
    BoundMode, CorralError, Operation, Pool, PoolConfig, RestartPolicy, StopReason,
    SupervisionEvent, Supervisor, SupervisorConfig, UnitStatus, current_unit, handler_fn,
    run_pools,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_status_visible_while_supervised() {
    let release = Arc::new(tokio::sync::Notify::new());
    let gate = release.clone();
    let op = Operation::new(move || {
        let gate = gate.clone();
        async move {
            gate.notified().await;
            Ok(())
        }
    });
    let pool = Pool::with_options("watched", op, [options::concurrency(2)]).unwrap();

    let runner = {
        let pool = pool.clone();
        tokio::spawn(async move { run_pools([pool], None).await })
    };

    while pool.units().len() < 2 {
        tokio::task::yield_now().await;
    }
    assert!(pool.healthy());
    assert_eq!(pool.status().len(), 2);

    // notify_waiters only wakes tasks already waiting, so keep nudging
    // until the run has finished.
    while !runner.is_finished() {
        release.notify_waiters();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let report = runner.await.unwrap();

    assert!(report.is_success());
    assert!(!pool.healthy());
    assert!(pool.units().iter().all(|u| u.status == UnitStatus::Finished));
}

#[tokio::test]
async fn test_mixed_pools_report_independently() {
    let steady = Pool::with_options(
        "steady",
        Operation::new(|| async { Ok(()) }),
        [options::concurrency(3)],
    )
    .unwrap();
    let broken = Pool::with_config(
        "broken",
        Operation::new(|| async { Err(CorralError::operation("disk full")) }),
        PoolConfig::default().with_restart(RestartPolicy::limited(1)),
    )
    .unwrap();

    let report = run_pools([steady, broken], None).await;

    assert_eq!(report.pools.len(), 2);
    assert!(report.pool("steady").unwrap().is_success());
    let broken = report.pool("broken").unwrap();
    assert_eq!(broken.runs, 2);
    assert_eq!(broken.stop, StopReason::RestartLimit);
    assert_eq!(broken.last_error, Some(CorralError::operation("disk full")));
    assert_eq!(
        report.failed_pools().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["broken"]
    );
}

#[tokio::test]
async fn test_abort_bound_failures_reach_handler() {
    let op = Operation::new(|| async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    });
    let config = PoolConfig::default()
        .with_concurrency(2)
        .with_timeout(Duration::from_millis(20))
        .with_bound_mode(BoundMode::Abort);
    let pool = Pool::with_config("hung", op, config).unwrap();
    let timeouts = Arc::new(AtomicU64::new(0));
    let counter = timeouts.clone();
    let handler = handler_fn(move |_pool, error| {
        let counter = counter.clone();
        async move {
            if matches!(error, CorralError::Timeout { .. }) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    let report = tokio::time::timeout(Duration::from_secs(5), run_pools([pool.clone()], Some(handler)))
        .await
        .unwrap();

    assert_eq!(timeouts.load(Ordering::SeqCst), 2);
    assert_eq!(report.pools[0].unit_failures, 2);
    assert!(pool.units().iter().all(|u| u.status == UnitStatus::Error));
}

#[tokio::test]
async fn test_wait_expired_units_are_reported() {
    let op = Operation::new(|| async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(())
    });
    let pool = Pool::with_options("lagging", op, [options::timeout(Duration::from_millis(10))]).unwrap();
    let supervisor = Supervisor::with_config(SupervisorConfig::default());
    let mut events = supervisor.subscribe();

    let report = supervisor.run_all([pool.clone()], None).await;

    assert_eq!(report.pools[0].detached_units, 1);
    assert!(report.is_success());
    assert_eq!(pool.status()["lagging-1"], "STARTED");

    let mut expired = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SupervisionEvent::UnitWaitExpired { unit, run, .. } = event {
            expired.push((unit, run));
        }
    }
    assert_eq!(expired, vec![("lagging-1".to_string(), 1)]);
}

#[tokio::test]
async fn test_operations_shard_by_ordinal() {
    let total = Arc::new(AtomicU64::new(0));
    let sum = total.clone();
    let op = Operation::new(move || {
        let sum = sum.clone();
        async move {
            let unit = current_unit().ok_or_else(|| CorralError::other("outside a unit"))?;
            sum.fetch_add(unit.ordinal as u64, Ordering::SeqCst);
            Ok(())
        }
    });
    let pool = Pool::with_options("shards", op, [options::concurrency(4)]).unwrap();

    run_pools([pool], None).await;

    assert_eq!(total.load(Ordering::SeqCst), 1 + 2 + 3 + 4);
}
