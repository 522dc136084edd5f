//! Pool configuration

use crate::backoff::BackoffConfig;
use crate::error::{CorralError, CorralResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a unit whose wait bound expires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundMode {
    /// Stop waiting; the operation keeps running in the background and its
    /// unit stays STARTED until it returns
    #[default]
    WaitOnly,
    /// Abort the unit's task and mark it ERROR with a timeout error.
    /// Blocking operations keep their thread until they return.
    Abort,
}

/// Restart policy applied after every completed run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RestartPolicy {
    /// Run exactly once
    #[default]
    Never,
    /// Run again after every completed run, failures included
    Always {
        /// Stop after this many restarts (None restarts forever)
        #[serde(default)]
        max_restarts: Option<u64>,
        /// Delay between runs (None restarts immediately)
        #[serde(default)]
        backoff: Option<BackoffConfig>,
    },
}

impl RestartPolicy {
    /// Restart forever, immediately, with no limit
    pub fn forever() -> Self {
        Self::Always {
            max_restarts: None,
            backoff: None,
        }
    }

    /// Restart at most `max_restarts` times
    pub fn limited(max_restarts: u64) -> Self {
        Self::Always {
            max_restarts: Some(max_restarts),
            backoff: None,
        }
    }

    /// Attach a backoff to an `Always` policy; no-op for `Never`
    pub fn with_backoff(self, config: BackoffConfig) -> Self {
        match self {
            Self::Always { max_restarts, .. } => Self::Always {
                max_restarts,
                backoff: Some(config),
            },
            Self::Never => Self::Never,
        }
    }

    pub fn restarts(&self) -> bool {
        matches!(self, Self::Always { .. })
    }

    /// Whether another run is allowed after `restarts` restarts so far
    pub fn should_restart(&self, restarts: u64) -> bool {
        match self {
            Self::Never => false,
            Self::Always { max_restarts, .. } => max_restarts.is_none_or(|max| restarts < max),
        }
    }

    pub fn backoff(&self) -> Option<&BackoffConfig> {
        match self {
            Self::Always { backoff, .. } => backoff.as_ref(),
            Self::Never => None,
        }
    }
}

/// Configuration of a single pool
///
/// This is the one configuration surface for pools. Positional parameters
/// and option functions both resolve to a value of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of execution units per run
    pub concurrency: usize,
    /// Restart policy applied after each run
    pub restart: RestartPolicy,
    /// Relative bound on how long a run waits for its units
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Absolute bound on how long a run waits; takes precedence over `timeout`
    pub deadline: Option<DateTime<Utc>>,
    /// Whether an expired bound also aborts the unit
    pub bound_mode: BoundMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            restart: RestartPolicy::Never,
            timeout: None,
            deadline: None,
            bound_mode: BoundMode::WaitOnly,
        }
    }
}

impl PoolConfig {
    /// Build a configuration from positional parameters
    pub fn from_params(
        concurrency: usize,
        restart_always: bool,
        timeout: Option<Duration>,
        deadline: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            concurrency,
            restart: if restart_always {
                RestartPolicy::forever()
            } else {
                RestartPolicy::Never
            },
            timeout,
            deadline,
            ..Default::default()
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_bound_mode(mut self, bound_mode: BoundMode) -> Self {
        self.bound_mode = bound_mode;
        self
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> CorralResult<()> {
        if self.concurrency == 0 {
            return Err(CorralError::config_with_context(
                "concurrency must be at least 1",
                "validating pool configuration",
            ));
        }

        if let Some(backoff) = self.restart.backoff() {
            if backoff.multiplier < 1.0 || !backoff.multiplier.is_finite() {
                return Err(CorralError::config_with_context(
                    format!("backoff multiplier must be >= 1.0, got {}", backoff.multiplier),
                    "validating pool restart policy",
                ));
            }
            if !(0.0..=1.0).contains(&backoff.jitter_ratio) {
                return Err(CorralError::config_with_context(
                    format!("jitter ratio must be within 0.0..=1.0, got {}", backoff.jitter_ratio),
                    "validating pool restart policy",
                ));
            }
        }

        Ok(())
    }

    /// Timeout that actually bounds a run; zero means unbounded
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.restart, RestartPolicy::Never);
        assert!(config.timeout.is_none());
        assert!(config.deadline.is_none());
        assert_eq!(config.bound_mode, BoundMode::WaitOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_params_matches_builder() {
        let from_params = PoolConfig::from_params(4, true, Some(Duration::from_secs(2)), None);
        let built = PoolConfig::default()
            .with_concurrency(4)
            .with_restart(RestartPolicy::forever())
            .with_timeout(Duration::from_secs(2));

        assert_eq!(from_params, built);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let error = PoolConfig::default().with_concurrency(0).validate().unwrap_err();
        assert_eq!(error.error_code(), "CORRAL_CONFIG");
    }

    #[test]
    fn test_bad_backoff_rejected() {
        let config = PoolConfig::default().with_restart(
            RestartPolicy::forever().with_backoff(BackoffConfig::default().multiplier(0.5)),
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let config = PoolConfig::default().with_timeout(Duration::ZERO);
        assert!(config.effective_timeout().is_none());
    }

    #[test]
    fn test_restart_limits() {
        assert!(!RestartPolicy::Never.should_restart(0));
        assert!(RestartPolicy::forever().should_restart(u64::MAX - 1));

        let limited = RestartPolicy::limited(2);
        assert!(limited.should_restart(0));
        assert!(limited.should_restart(1));
        assert!(!limited.should_restart(2));
    }

    #[test]
    fn test_backoff_ignored_for_never() {
        let policy = RestartPolicy::Never.with_backoff(BackoffConfig::default());
        assert_eq!(policy, RestartPolicy::Never);
        assert!(policy.backoff().is_none());
    }

    #[test]
    fn test_deserialize_from_toml() {
        let config: PoolConfig = toml::from_str(
            r#"
concurrency = 3
timeout = "1s 500ms"
bound_mode = "abort"

[restart]
mode = "always"
max_restarts = 10
"#,
        )
        .unwrap();

        assert_eq!(config.concurrency, 3);
        assert_eq!(config.timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.bound_mode, BoundMode::Abort);
        assert_eq!(config.restart, RestartPolicy::limited(10));
    }
}
