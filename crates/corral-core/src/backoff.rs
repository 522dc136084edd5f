//! Restart backoff
//!
//! Delays inserted between consecutive runs of a restarting pool. Without a
//! backoff a restarting pool begins its next run as soon as the previous
//! run's barrier clears.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for backoff behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first restart
    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,
    /// Maximum delay between restarts
    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,
    /// Multiplier applied per restart (1.0 gives a constant delay)
    pub multiplier: f64,
    /// Add random jitter to prevent restart storms across pools
    #[serde(default)]
    pub jitter: bool,
    /// Maximum jitter ratio (0.0 - 1.0)
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,
}

fn default_jitter_ratio() -> f64 {
    0.2
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: false,
            jitter_ratio: default_jitter_ratio(),
        }
    }
}

impl BackoffConfig {
    /// Exponential backoff starting at `initial_delay`
    pub fn with_initial_delay(initial_delay: Duration) -> Self {
        Self {
            initial_delay,
            ..Default::default()
        }
    }

    /// The same delay before every restart
    pub fn constant(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            multiplier: 1.0,
            jitter: false,
            jitter_ratio: 0.0,
        }
    }

    /// Set the maximum delay
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Set the multiplier
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Enable or disable jitter
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }
}

/// Exponential backoff driven by a [`BackoffConfig`]
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn with_config(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Get the delay for the given attempt number (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let base_delay =
            self.config.initial_delay.as_secs_f64() * self.config.multiplier.powi(exponent);

        let capped = base_delay.min(self.config.max_delay.as_secs_f64());
        let delay = Duration::try_from_secs_f64(capped.max(0.0)).unwrap_or(self.config.max_delay);
        self.add_jitter(delay)
    }

    /// Get the next delay and advance the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        if !self.config.jitter {
            return delay;
        }

        let jitter_range = delay.as_secs_f64() * self.config.jitter_ratio;
        let jittered = delay.as_secs_f64() + rand_jitter(jitter_range);

        Duration::try_from_secs_f64(jittered.max(0.0)).unwrap_or(delay)
    }
}

/// Hash of the current sub-second clock scaled into `0..range`
fn rand_jitter(range: f64) -> f64 {
    use std::time::SystemTime;

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);

    let hash = nanos.wrapping_mul(2654435761);
    let normalized = (hash as f64) / (u32::MAX as f64);

    normalized * range
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_delays() {
        let backoff = ExponentialBackoff::with_config(BackoffConfig {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: false,
            jitter_ratio: 0.0,
        });

        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_capped() {
        let backoff = ExponentialBackoff::with_config(
            BackoffConfig::with_initial_delay(Duration::from_secs(1)).max_delay(Duration::from_secs(5)),
        );

        assert_eq!(backoff.delay_for_attempt(10), Duration::from_secs(5));
        assert_eq!(backoff.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_unbounded_max_delay_saturates() {
        let config = BackoffConfig::with_initial_delay(Duration::from_secs(1)).max_delay(Duration::MAX);
        let backoff = ExponentialBackoff::with_config(config.clone());
        assert_eq!(backoff.delay_for_attempt(100), Duration::MAX);

        let jittered = ExponentialBackoff::with_config(config.jitter(true));
        assert_eq!(jittered.delay_for_attempt(100), Duration::MAX);
    }

    #[test]
    fn test_constant_backoff() {
        let backoff = ExponentialBackoff::with_config(BackoffConfig::constant(Duration::from_millis(250)));

        assert_eq!(backoff.delay_for_attempt(0), Duration::from_millis(250));
        assert_eq!(backoff.delay_for_attempt(7), Duration::from_millis(250));
    }

    #[test]
    fn test_jitter_stays_within_ratio() {
        let config = BackoffConfig::constant(Duration::from_secs(1)).jitter(true);
        let config = BackoffConfig {
            jitter_ratio: 0.5,
            ..config
        };
        let backoff = ExponentialBackoff::with_config(config);

        let delay = backoff.delay_for_attempt(0);
        assert!(delay >= Duration::from_secs(1));
        assert!(delay <= Duration::from_millis(1500));
    }

    #[test]
    fn test_next_delay_and_reset() {
        let mut backoff = ExponentialBackoff::with_config(BackoffConfig::default());

        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.attempt, 2);

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
