//! From trait implementations for CorralError conversions

use super::types::CorralError;

impl From<anyhow::Error> for CorralError {
    fn from(error: anyhow::Error) -> Self {
        Self::operation(format!("{:#}", error))
    }
}

impl From<std::io::Error> for CorralError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for CorralError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<tokio::task::JoinError> for CorralError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_panic() {
            Self::panic(panic_message(error.into_panic()))
        } else {
            Self::other(format!("Task did not complete: {}", error))
        }
    }
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResultExt;

    #[test]
    fn test_anyhow_conversion_keeps_chain() {
        let error = anyhow::anyhow!("disk full").context("writing batch");
        let converted: CorralError = error.into();

        assert_eq!(converted.error_code(), "CORRAL_OPERATION");
        assert_eq!(converted.to_string(), "Operation failed: writing batch: disk full");
    }

    #[test]
    fn test_io_conversion() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let converted: CorralError = error.into();
        assert!(matches!(converted, CorralError::Io { .. }));
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "Unknown panic");
    }

    #[test]
    fn test_result_context() {
        let result: Result<(), &str> = Err("refused");
        let error = result.context("connecting").unwrap_err();
        assert_eq!(error.to_string(), "Error: connecting: refused");
    }

    #[test]
    fn test_supervision_display() {
        let error = CorralError::supervision(vec!["ingest".into(), "export".into()]);
        assert_eq!(error.to_string(), "Supervision failed for pools: ingest, export");
        assert!(!error.is_operation_failure());
    }
}
