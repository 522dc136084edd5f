//! Configuration for pools, the supervisor and logging
//!
//! Every setting has a default, so a `CorralConfig` can be built in code,
//! loaded from a TOML/YAML/JSON file, or both, with `CORRAL_*` environment
//! variables applied last.

mod loader;
mod logging_config;
pub mod options;
mod pool_config;
mod supervisor_config;

pub use loader::{CorralConfig, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_WATCHDOG, load, load_from_file};
pub use logging_config::{LogFormat, LoggingConfig};
pub use options::PoolOption;
pub use pool_config::{BoundMode, PoolConfig, RestartPolicy};
pub use supervisor_config::{EVENT_CAPACITY, HANDLER_WATCHDOG_SECS, SupervisorConfig};
