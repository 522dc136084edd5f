//! Corral
//!
//! In-process supervisor for pools of concurrently executed work units.
//! This crate re-exports the engine from `corral-core` and adds process-level
//! setup such as logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use corral::prelude::*;
//!
//! # async fn example() -> CorralResult<()> {
//! let op = Operation::new(|| async {
//!     let unit = current_unit().map(|u| u.ordinal).unwrap_or_default();
//!     if unit == 2 {
//!         return Err(CorralError::operation("shard 2 unavailable"));
//!     }
//!     Ok(())
//! });
//! let pool = Pool::with_params("job", op, 3, false, None, None)?;
//!
//! let handler = handler_fn(|pool, error| async move {
//!     tracing::error!(pool = %pool.name(), %error, "unit failed");
//! });
//! let report = run_pools([pool], Some(handler)).await;
//! assert_eq!(report.total_failures(), 1);
//! # Ok(())
//! # }
//! ```

pub mod logging;

pub use corral_core::*;

/// Commonly used types
pub mod prelude {
    pub use corral_core::{
        BoundMode, CorralConfig, CorralError, CorralResult, FailureHandler, Operation, Pool,
        PoolConfig, RestartPolicy, StopReason, SupervisionEvent, SupervisionReport, Supervisor,
        SupervisorConfig, blocking_handler_fn, config::options, current_unit, handler_fn,
        run_pools,
    };
}
