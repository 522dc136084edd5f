//! End-to-end supervision of a small job pool

use anyhow::Context;
use corral::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

fn load_shard(ordinal: usize) -> anyhow::Result<()> {
    if ordinal == 2 {
        anyhow::bail!("shard {} is offline", ordinal);
    }
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_job_pool_reports_failed_shard() {
    let op = Operation::new(|| async {
        let unit = current_unit().context("no unit")?;
        load_shard(unit.ordinal).context("loading shard")?;
        Ok(())
    });
    let pool = Pool::with_params("job", op, 3, false, None, None).unwrap();

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let handler = handler_fn(move |pool, error| {
        let counter = counter.clone();
        async move {
            assert_eq!(pool.name(), "job");
            assert_eq!(error.to_string(), "Operation failed: loading shard: shard 2 is offline");
            counter.fetch_add(1, Ordering::SeqCst);
        }
    });

    let report = run_pools([pool.clone()], Some(handler)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let status = pool.status();
    assert_eq!(status["job-1"], "FINISHED");
    assert_eq!(status["job-2"], "ERROR");
    assert_eq!(status["job-3"], "FINISHED");
    assert!(!pool.healthy());
    assert!(pool.finished_at().unwrap() >= pool.started_at().unwrap());

    let error = report.into_result().unwrap_err();
    assert_eq!(error, CorralError::supervision(vec!["job".to_string()]));
}

#[tokio::test]
async fn test_blocking_handler_sees_every_failure() {
    let pool = Pool::with_options(
        "sync",
        Operation::blocking(|| Err(CorralError::operation("nope"))),
        [options::concurrency(3), options::restart(RestartPolicy::limited(1))],
    )
    .unwrap();
    let seen = Arc::new(AtomicU32::new(0));
    let counter = seen.clone();
    let handler = blocking_handler_fn(move |_pool, _error| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let report = run_pools([pool], Some(handler)).await;

    assert_eq!(seen.load(Ordering::SeqCst), 6);
    assert_eq!(report.pools[0].handled, 6);
    assert_eq!(report.pools[0].restarts, 1);
}
