//! The unit of work a pool executes

use super::context;
use crate::error::{CorralError, CorralResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by one invocation of an [`Operation`]
pub type OperationFuture = BoxFuture<'static, CorralResult<()>>;

/// A zero-argument operation shared by every unit of a pool
///
/// Cloning is cheap; all clones invoke the same function.
#[derive(Clone)]
pub struct Operation {
    inner: Arc<dyn Fn() -> OperationFuture + Send + Sync>,
    blocking: bool,
}

impl Operation {
    /// Wrap an async function
    ///
    /// ```rust
    /// use corral_core::Operation;
    ///
    /// let op = Operation::new(|| async { Ok(()) });
    /// assert!(!op.is_blocking());
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CorralResult<()>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move || f().boxed()),
            blocking: false,
        }
    }

    /// Wrap a synchronous function; each invocation runs on the blocking
    /// thread pool
    pub fn blocking<F>(f: F) -> Self
    where
        F: Fn() -> CorralResult<()> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self {
            inner: Arc::new(move || {
                let f = Arc::clone(&f);
                let unit = context::current_unit();
                async move {
                    tokio::task::spawn_blocking(move || context::sync_scope(unit, || f()))
                        .await
                        .map_err(CorralError::from)?
                }
                .boxed()
            }),
            blocking: true,
        }
    }

    /// Whether invocations occupy a blocking thread
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub(crate) fn invoke(&self) -> OperationFuture {
        (self.inner)()
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("blocking", &self.blocking)
            .finish_non_exhaustive()
    }
}
