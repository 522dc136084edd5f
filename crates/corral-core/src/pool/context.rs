//! Identity of the unit executing the current operation
//!
//! Operations take no arguments. Code that needs to know which unit it is
//! running as (to shard work by ordinal, or to tag its own logs) reads
//! [`current_unit`] from inside the operation.

use std::future::Future;

/// Identity of one execution unit within one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitContext {
    pub pool: String,
    pub ordinal: usize,
    pub unit: String,
    pub run: u64,
}

tokio::task_local! {
    static CURRENT_UNIT: UnitContext;
}

/// The unit running the calling operation, if called from one
///
/// Available in async operations and in [`Operation::blocking`](super::Operation::blocking)
/// closures.
pub fn current_unit() -> Option<UnitContext> {
    CURRENT_UNIT.try_with(|context| context.clone()).ok()
}

pub(crate) async fn scope<F: Future>(context: UnitContext, future: F) -> F::Output {
    CURRENT_UNIT.scope(context, future).await
}

pub(crate) fn sync_scope<R>(context: Option<UnitContext>, f: impl FnOnce() -> R) -> R {
    match context {
        Some(context) => CURRENT_UNIT.sync_scope(context, f),
        None => f(),
    }
}
