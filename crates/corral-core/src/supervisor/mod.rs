//! Pool supervision
//!
//! Each supervised pool gets two cooperating tasks:
//! - a restart loop that runs the pool, consults its restart policy and
//!   optionally backs off between runs
//! - a handler loop that drains the pool's failure channel and passes each
//!   failure to the user's [`FailureHandler`] under a watchdog timeout

mod engine;
mod handler;
mod handler_loop;
mod restart_loop;
mod types;


pub use engine::{Supervisor, run_pools};
pub use handler::{FailureHandler, SharedFailureHandler, blocking_handler_fn, handler_fn};
pub use types::{PoolOutcome, StopReason, SupervisionEvent, SupervisionReport};
