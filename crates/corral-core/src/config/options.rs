//! Option functions for pool construction
//!
//! Each function returns a [`PoolOption`] that edits a [`PoolConfig`].
//! Options are applied in order after defaults, so a later option wins.
//!
//! ```rust
//! use corral_core::config::options;
//! use corral_core::config::PoolConfig;
//! use std::time::Duration;
//!
//! let config = options::apply([
//!     options::concurrency(4),
//!     options::restart_always(),
//!     options::timeout(Duration::from_secs(30)),
//! ]);
//! assert_eq!(config, PoolConfig::from_params(4, true, Some(Duration::from_secs(30)), None));
//! ```

use super::pool_config::{BoundMode, PoolConfig, RestartPolicy};
use crate::backoff::BackoffConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A composable edit applied to a [`PoolConfig`]
pub type PoolOption = Box<dyn FnOnce(&mut PoolConfig) + Send>;

/// Apply options in order on top of the default configuration
pub fn apply(options: impl IntoIterator<Item = PoolOption>) -> PoolConfig {
    let mut config = PoolConfig::default();
    for option in options {
        option(&mut config);
    }
    config
}

/// Number of execution units per run
pub fn concurrency(concurrency: usize) -> PoolOption {
    Box::new(move |config| config.concurrency = concurrency)
}

/// Restart forever after every run
pub fn restart_always() -> PoolOption {
    Box::new(|config| config.restart = RestartPolicy::forever())
}

/// Use an explicit restart policy
pub fn restart(policy: RestartPolicy) -> PoolOption {
    Box::new(move |config| config.restart = policy)
}

/// Delay restarts of an `Always` policy
pub fn restart_backoff(backoff: BackoffConfig) -> PoolOption {
    Box::new(move |config| {
        config.restart = std::mem::take(&mut config.restart).with_backoff(backoff);
    })
}

/// Bound each run's wait relative to its start
pub fn timeout(timeout: Duration) -> PoolOption {
    Box::new(move |config| config.timeout = Some(timeout))
}

/// Bound each run's wait by an absolute point in time
pub fn deadline(deadline: DateTime<Utc>) -> PoolOption {
    Box::new(move |config| config.deadline = Some(deadline))
}

/// Abort units whose wait bound expires instead of only stopping the wait
pub fn abort_on_bound() -> PoolOption {
    Box::new(|config| config.bound_mode = BoundMode::Abort)
}
