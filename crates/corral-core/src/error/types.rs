//! Core error type for Corral

use std::time::Duration;
use thiserror::Error;

/// Result type alias for Corral operations
pub type CorralResult<T> = Result<T, CorralError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<C: std::fmt::Display>(self, context: C) -> CorralResult<T>;

    /// Add context lazily (only evaluated on error)
    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> CorralResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context<C: std::fmt::Display>(self, context: C) -> CorralResult<T> {
        self.map_err(|e| CorralError::other(format!("{}: {}", context, e)))
    }

    fn with_context<C: std::fmt::Display, F: FnOnce() -> C>(self, f: F) -> CorralResult<T> {
        self.map_err(|e| CorralError::other(format!("{}: {}", f(), e)))
    }
}

/// Main error type for Corral
///
/// Operation failures, configuration problems and supervision outcomes all
/// share this type so a failure can be stored on a unit, routed through the
/// failure channel and copied into a report without conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CorralError {
    /// The pool's operation returned an error
    #[error("Operation failed: {message}")]
    Operation {
        message: String,
        context: Option<String>,
    },

    /// The pool's operation panicked
    #[error("Operation panicked: {message}")]
    Panic { message: String },

    /// A wait bound expired and the unit was aborted
    #[error("Execution aborted after {bound:?}")]
    Timeout {
        bound: Duration,
        context: Option<String>,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: Option<String>,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json { message: String },

    /// One or more supervised pools ended with failures
    #[error("Supervision failed for pools: {}", pools.join(", "))]
    Supervision { pools: Vec<String> },

    /// Generic error with context
    #[error("Error: {message}")]
    Other {
        message: String,
        context: Option<String>,
    },
}

impl CorralError {
    /// Get the error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Operation { .. } => "CORRAL_OPERATION",
            Self::Panic { .. } => "CORRAL_PANIC",
            Self::Timeout { .. } => "CORRAL_TIMEOUT",
            Self::Config { .. } => "CORRAL_CONFIG",
            Self::Io { .. } => "CORRAL_IO",
            Self::Json { .. } => "CORRAL_JSON",
            Self::Supervision { .. } => "CORRAL_SUPERVISION",
            Self::Other { .. } => "CORRAL_OTHER",
        }
    }

    /// Get optional context about the error
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Operation { context, .. }
            | Self::Timeout { context, .. }
            | Self::Config { context, .. }
            | Self::Other { context, .. } => context.as_deref(),
            Self::Io { path, .. } => path.as_deref(),
            Self::Panic { .. } | Self::Json { .. } | Self::Supervision { .. } => None,
        }
    }

    /// Whether this error was raised by the supervised operation itself
    /// rather than by the engine around it
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, Self::Operation { .. } | Self::Panic { .. } | Self::Other { .. })
    }
}
