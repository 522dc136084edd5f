//! The pool handle: identity, configuration and run state

use super::operation::Operation;
use super::unit::{ExecutionUnit, UnitSnapshot, UnitStatus};
use crate::config::{CorralConfig, PoolConfig, PoolOption, options};
use crate::error::CorralResult;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Default, Clone, Copy)]
struct Timestamps {
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

pub(crate) struct PoolInner {
    id: Uuid,
    name: String,
    operation: Operation,
    config: PoolConfig,
    timestamps: RwLock<Timestamps>,
    restarts: AtomicU64,
    runs: AtomicU64,
    /// Units of the most recent run, index = ordinal - 1
    units: RwLock<Vec<ExecutionUnit>>,
}

/// A named group of concurrent executions of one operation
///
/// `Pool` is a cheap, cloneable handle; clones observe the same state.
///
/// # Example
///
/// ```rust
/// use corral_core::{Operation, Pool, failure_channel};
///
/// # #[tokio::main]
/// # async fn main() {
/// let pool = Pool::with_params("job", Operation::new(|| async { Ok(()) }), 3, false, None, None)
///     .unwrap();
/// let (tx, _rx) = failure_channel(pool.concurrency());
///
/// let report = pool.run(&tx).await;
/// assert!(report.is_clean());
/// assert_eq!(pool.status().len(), 3);
/// assert!(!pool.healthy());
/// # }
/// ```
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
}

impl Pool {
    /// Create a pool with the default configuration (one unit, no restart,
    /// no bound)
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self::build(name.into(), operation, PoolConfig::default())
    }

    /// Create a pool from a configuration structure
    pub fn with_config(
        name: impl Into<String>,
        operation: Operation,
        config: PoolConfig,
    ) -> CorralResult<Self> {
        config.validate()?;
        Ok(Self::build(name.into(), operation, config))
    }

    /// Create a pool from option functions applied in order after defaults
    pub fn with_options(
        name: impl Into<String>,
        operation: Operation,
        options: impl IntoIterator<Item = PoolOption>,
    ) -> CorralResult<Self> {
        Self::with_config(name, operation, options::apply(options))
    }

    /// Create a pool from positional parameters
    pub fn with_params(
        name: impl Into<String>,
        operation: Operation,
        concurrency: usize,
        restart_always: bool,
        timeout: Option<Duration>,
        deadline: Option<DateTime<Utc>>,
    ) -> CorralResult<Self> {
        let config = PoolConfig::from_params(concurrency, restart_always, timeout, deadline);
        Self::with_config(name, operation, config)
    }

    /// Create a pool from the entry named `name` in a loaded configuration
    pub fn from_settings(
        name: impl Into<String>,
        operation: Operation,
        settings: &CorralConfig,
    ) -> CorralResult<Self> {
        let name = name.into();
        let config = settings.pool(&name);
        Self::with_config(name, operation, config)
    }

    fn build(name: String, operation: Operation, config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                id: Uuid::new_v4(),
                name,
                operation,
                config,
                timestamps: RwLock::new(Timestamps::default()),
                restarts: AtomicU64::new(0),
                runs: AtomicU64::new(0),
                units: RwLock::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<PoolInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<PoolInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    pub fn concurrency(&self) -> usize {
        self.inner.config.concurrency
    }

    pub(crate) fn operation(&self) -> &Operation {
        &self.inner.operation
    }

    /// Number of restarts performed so far
    pub fn restarts(&self) -> u64 {
        self.inner.restarts.load(Ordering::SeqCst)
    }

    /// Number of runs started so far
    pub fn runs(&self) -> u64 {
        self.inner.runs.load(Ordering::SeqCst)
    }

    /// Start time of the most recent run
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.timestamps.read().started_at
    }

    /// Set once the pool has stopped restarting
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.inner.timestamps.read().finished_at
    }

    /// Snapshots of the most recent run's units in ordinal order
    pub fn units(&self) -> Vec<UnitSnapshot> {
        self.inner.units.read().iter().map(|u| u.snapshot()).collect()
    }

    /// Snapshot of one unit of the most recent run
    pub fn unit(&self, ordinal: usize) -> Option<UnitSnapshot> {
        let index = ordinal.checked_sub(1)?;
        self.inner.units.read().get(index).map(|u| u.snapshot())
    }

    /// Unit name to status string for the most recent run
    pub fn status(&self) -> BTreeMap<String, String> {
        self.inner
            .units
            .read()
            .iter()
            .map(|u| (u.name().to_string(), u.status().as_str().to_string()))
            .collect()
    }

    /// True while any unit of the most recent run is still STARTED
    pub fn healthy(&self) -> bool {
        self.inner
            .units
            .read()
            .iter()
            .any(|u| u.status() == UnitStatus::Started)
    }

    /// Alias of [`Pool::healthy`]
    pub fn is_up(&self) -> bool {
        self.healthy()
    }

    /// Whether two handles refer to the same pool
    pub fn ptr_eq(&self, other: &Pool) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(super) fn begin_run(&self, started_at: DateTime<Utc>) -> u64 {
        self.inner.timestamps.write().started_at = Some(started_at);
        self.inner.runs.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Replace the previous run's units
    pub(super) fn install_units(&self, units: Vec<ExecutionUnit>) {
        *self.inner.units.write() = units;
    }

    pub(crate) fn record_restart(&self) -> u64 {
        self.inner.restarts.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn mark_finished(&self) {
        self.inner.timestamps.write().finished_at = Some(Utc::now());
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("concurrency", &self.inner.config.concurrency)
            .field("restarts", &self.restarts())
            .finish()
    }
}
