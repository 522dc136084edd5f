//! Constructor methods for CorralError

use super::types::CorralError;
use std::time::Duration;

impl CorralError {
    /// Create a new operation error
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            context: None,
        }
    }

    /// Create an operation error with context
    pub fn operation_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a panic error from a caught panic payload
    pub fn panic(message: impl Into<String>) -> Self {
        Self::Panic {
            message: message.into(),
        }
    }

    /// Create a timeout error for an aborted unit
    pub fn timeout(bound: Duration) -> Self {
        Self::Timeout {
            bound,
            context: None,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error with context
    pub fn config_with_context(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            context: Some(context.into()),
        }
    }

    /// Create a new IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: None,
        }
    }

    /// Create an IO error for a specific path
    pub fn io_with_path(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Json {
            message: message.into(),
        }
    }

    /// Create a supervision error naming the failed pools
    pub fn supervision(pools: Vec<String>) -> Self {
        Self::Supervision { pools }
    }

    /// Create a generic error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            context: None,
        }
    }
}
