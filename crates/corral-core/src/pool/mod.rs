//! Pools and their execution units
//!
//! A [`Pool`] runs `concurrency` copies of one [`Operation`] per run and
//! waits for all of them behind a single barrier, optionally bounded by a
//! timeout or deadline. Unit state lives in per-unit lock-guarded slots
//! indexed by ordinal, so [`Pool::status`] and [`Pool::healthy`] can be read
//! from any task while a run is in flight.

mod bound;
mod context;
mod operation;
mod report;
mod run;
mod types;
mod unit;


pub use context::{UnitContext, current_unit};
pub use operation::{Operation, OperationFuture};
pub use report::{RunReport, UnitOutcome, UnitReport};
pub use types::Pool;
pub use unit::{UnitSnapshot, UnitStatus};
