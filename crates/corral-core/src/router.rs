//! Failure routing from execution units to the handler loop
//!
//! Each pool gets one bounded channel whose capacity equals its
//! concurrency. Units are producers, the handler loop is the single consumer.
//! The restart loop holds the only long-lived [`FailureSender`]; units hold
//! weak handles, so dropping that sender once the pool stops for good closes
//! the channel even while detached operations are still running.

use crate::error::CorralError;
use crate::pool::Pool;
use tokio::sync::mpsc;

/// A unit failure in transit to the handler loop
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// Pool whose unit failed
    pub pool: Pool,
    /// Ordinal of the failed unit (1-based)
    pub ordinal: usize,
    /// Derived unit name, `<pool-name>-<ordinal>`
    pub unit: String,
    /// Run number that launched the unit (1-based)
    pub run: u64,
    /// Error raised by the operation
    pub error: CorralError,
}

/// Create a failure channel with room for `capacity` in-flight records
///
/// # Panics
///
/// Panics if `capacity` is zero; pool configuration rejects that earlier.
pub fn failure_channel(capacity: usize) -> (FailureSender, FailureReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (FailureSender { tx }, FailureReceiver { rx })
}

/// Producer side of a failure channel
#[derive(Debug, Clone)]
pub struct FailureSender {
    tx: mpsc::Sender<FailureRecord>,
}

impl FailureSender {
    /// Push a record, waiting for capacity. Returns false once the
    /// receiver is gone.
    pub async fn send(&self, record: FailureRecord) -> bool {
        self.tx.send(record).await.is_ok()
    }

    pub(crate) fn downgrade(&self) -> WeakFailureSender {
        WeakFailureSender {
            tx: self.tx.downgrade(),
        }
    }

    /// True once the receiver has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Non-owning producer handle held by execution units
#[derive(Debug, Clone)]
pub(crate) struct WeakFailureSender {
    tx: mpsc::WeakSender<FailureRecord>,
}

impl WeakFailureSender {
    /// Deliver a record if the pool is still supervised.
    ///
    /// Returns false when every strong sender has been dropped (the pool
    /// stopped for good) or the receiver is gone.
    pub(crate) async fn send(&self, record: FailureRecord) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(record).await.is_ok(),
            None => false,
        }
    }
}

/// Consumer side of a failure channel
#[derive(Debug)]
pub struct FailureReceiver {
    rx: mpsc::Receiver<FailureRecord>,
}

impl FailureReceiver {
    /// Next record; None once the channel is closed and drained
    pub async fn recv(&mut self) -> Option<FailureRecord> {
        self.rx.recv().await
    }

    /// Next record if one is buffered right now
    pub fn try_recv(&mut self) -> Option<FailureRecord> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently buffered
    pub fn drain(&mut self) -> Vec<FailureRecord> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sender_sees_receiver_drop() {
        let (tx, rx) = failure_channel(1);
        assert!(!tx.is_closed());

        drop(rx);
        assert!(tx.is_closed());
    }

    #[tokio::test]
    async fn test_weak_sender_fails_once_strong_sender_dropped() {
        let (tx, mut rx) = failure_channel(1);
        let weak = tx.downgrade();
        drop(tx);

        assert!(rx.recv().await.is_none());
        let record = FailureRecord {
            pool: Pool::new("gone", crate::pool::Operation::new(|| async { Ok(()) })),
            ordinal: 1,
            unit: "gone-1".to_string(),
            run: 1,
            error: CorralError::operation("late"),
        };
        assert!(!weak.send(record).await);
    }
}
