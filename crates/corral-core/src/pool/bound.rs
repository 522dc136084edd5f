//! How long a run waits for its units

use crate::config::PoolConfig;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Wait bound derived from a pool's configuration at the start of a run
///
/// Precedence: a deadline wins over a timeout; a zero timeout is ignored.
/// A bound too far out to represent as an `Instant` is treated as unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitBound {
    Unbounded,
    Deadline { at: Instant, span: Duration },
    Timeout { at: Instant, span: Duration },
}

impl WaitBound {
    pub(crate) fn from_config(config: &PoolConfig, now: DateTime<Utc>) -> Self {
        let start = Instant::now();
        if let Some(deadline) = config.deadline {
            // A deadline already in the past expires immediately.
            let span = (deadline - now).to_std().unwrap_or(Duration::ZERO);
            return match start.checked_add(span) {
                Some(at) => Self::Deadline { at, span },
                None => Self::Unbounded,
            };
        }
        match config
            .effective_timeout()
            .and_then(|span| start.checked_add(span).map(|at| (at, span)))
        {
            Some((at, span)) => Self::Timeout { at, span },
            None => Self::Unbounded,
        }
    }

    pub(crate) fn expires_at(&self) -> Option<Instant> {
        match self {
            Self::Unbounded => None,
            Self::Deadline { at, .. } | Self::Timeout { at, .. } => Some(*at),
        }
    }

    /// Length of the bound as measured from the start of the run
    pub(crate) fn span(&self) -> Option<Duration> {
        match self {
            Self::Unbounded => None,
            Self::Deadline { span, .. } | Self::Timeout { span, .. } => Some(*span),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Unbounded => "unbounded",
            Self::Deadline { .. } => "deadline",
            Self::Timeout { .. } => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_by_default() {
        let bound = WaitBound::from_config(&PoolConfig::default(), Utc::now());
        assert_eq!(bound, WaitBound::Unbounded);
        assert!(bound.expires_at().is_none());
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let config = PoolConfig::default().with_timeout(Duration::ZERO);
        assert_eq!(WaitBound::from_config(&config, Utc::now()), WaitBound::Unbounded);
    }

    #[test]
    fn test_deadline_takes_precedence() {
        let now = Utc::now();
        let config = PoolConfig::default()
            .with_timeout(Duration::from_secs(1))
            .with_deadline(now + chrono::Duration::seconds(60));

        let bound = WaitBound::from_config(&config, now);
        assert_eq!(bound.kind(), "deadline");
        assert_eq!(bound.span(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_past_deadline_expires_immediately() {
        let now = Utc::now();
        let config = PoolConfig::default().with_deadline(now - chrono::Duration::seconds(5));

        let bound = WaitBound::from_config(&config, now);
        assert_eq!(bound.span(), Some(Duration::ZERO));
    }

    #[test]
    fn test_timeout_bound() {
        let config = PoolConfig::default().with_timeout(Duration::from_millis(250));
        let bound = WaitBound::from_config(&config, Utc::now());

        assert_eq!(bound.kind(), "timeout");
        assert_eq!(bound.span(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_unrepresentable_timeout_is_unbounded() {
        let config = PoolConfig::default().with_timeout(Duration::MAX);
        assert_eq!(WaitBound::from_config(&config, Utc::now()), WaitBound::Unbounded);
    }
}
