//! Failure handlers invoked by the handler loop

use crate::error::CorralError;
use crate::pool::Pool;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Callback receiving every failure routed out of a pool
///
/// Each invocation runs in its own task and is raced against the
/// supervisor's watchdog. An invocation that outlives the watchdog is not
/// cancelled; the handler loop simply stops waiting for it.
#[async_trait]
pub trait FailureHandler: Send + Sync + 'static {
    async fn handle(&self, pool: &Pool, error: &CorralError);
}

/// Shared handler as accepted by the supervisor
pub type SharedFailureHandler = Arc<dyn FailureHandler>;

/// Build a handler from an async closure
///
/// ```rust
/// use corral_core::supervisor::handler_fn;
///
/// let handler = handler_fn(|pool, error| async move {
///     tracing::error!(pool = %pool.name(), %error, "unit failed");
/// });
/// # drop(handler);
/// ```
pub fn handler_fn<F, Fut>(f: F) -> SharedFailureHandler
where
    F: Fn(Pool, CorralError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Build a handler from a synchronous closure run on the blocking pool
pub fn blocking_handler_fn<F>(f: F) -> SharedFailureHandler
where
    F: Fn(&Pool, &CorralError) + Send + Sync + 'static,
{
    Arc::new(BlockingFnHandler(Arc::new(f)))
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> FailureHandler for FnHandler<F>
where
    F: Fn(Pool, CorralError) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, pool: &Pool, error: &CorralError) {
        (self.0)(pool.clone(), error.clone()).await
    }
}

struct BlockingFnHandler<F>(Arc<F>);

#[async_trait]
impl<F> FailureHandler for BlockingFnHandler<F>
where
    F: Fn(&Pool, &CorralError) + Send + Sync + 'static,
{
    async fn handle(&self, pool: &Pool, error: &CorralError) {
        let f = Arc::clone(&self.0);
        let pool = pool.clone();
        let error = error.clone();

        if let Err(join_error) = tokio::task::spawn_blocking(move || f(&pool, &error)).await {
            if join_error.is_panic() {
                std::panic::resume_unwind(join_error.into_panic());
            }
        }
    }
}
