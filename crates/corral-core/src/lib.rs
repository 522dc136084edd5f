//! Corral Core Library
//!
//! Supervision engine for pools of concurrently executed work units:
//! pools run N copies of an operation behind a bounded barrier, failures are
//! routed through a per-pool channel to a user handler, and pools are
//! restarted according to their restart policy.

pub mod backoff;
pub mod config;
pub mod error;
pub mod pool;
pub mod router;
pub mod supervisor;

// Re-export commonly used types
pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use config::{BoundMode, CorralConfig, LogFormat, LoggingConfig, PoolConfig, RestartPolicy, SupervisorConfig};
pub use error::{CorralError, CorralResult, ResultExt};
pub use pool::{Operation, Pool, RunReport, UnitContext, UnitOutcome, UnitSnapshot, UnitStatus, current_unit};
pub use router::{FailureReceiver, FailureRecord, FailureSender, failure_channel};
pub use supervisor::{
    FailureHandler, PoolOutcome, StopReason, SupervisionEvent, SupervisionReport, Supervisor,
    blocking_handler_fn, handler_fn, run_pools,
};
