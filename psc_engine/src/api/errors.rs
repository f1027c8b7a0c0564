//! # Runner Errors

use crate::sources::SourceError;
use psc_catalog::catalog::CatalogError;
use psc_catalog::logging::{codes, Code};

/// Errors that refuse or abort a whole run
///
/// Per-policy failures never surface here; they are recorded in the
/// report's `failures` list.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The catalog cannot produce a single verdict
    #[error("Catalog unusable: {0}")]
    CatalogUnusable(#[source] CatalogError),

    /// Policies could not be fetched
    #[error("Policy source error: {0}")]
    Source(#[from] SourceError),

    /// A worker thread died outside per-policy isolation
    #[error("Worker thread failed: {message}")]
    ThreadError { message: String },

    /// Invalid runner configuration
    #[error("Configuration error: {reason}")]
    ConfigurationError { reason: String },
}

impl RunnerError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            RunnerError::Source(e) => e.is_recoverable(),
            RunnerError::ConfigurationError { .. } => true,
            RunnerError::CatalogUnusable(_) | RunnerError::ThreadError { .. } => false,
        }
    }

    pub fn log_code(&self) -> Code {
        match self {
            RunnerError::CatalogUnusable(_) => codes::catalog::CATALOG_UNUSABLE,
            RunnerError::Source(e) => e.log_code(),
            RunnerError::ThreadError { .. } => codes::runner::WORKER_THREAD_FAILURE,
            RunnerError::ConfigurationError { .. } => codes::system::CONFIGURATION_INVALID,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RunnerError::CatalogUnusable(e) => {
                format!("The requirement catalog cannot be used: {}", e)
            }
            RunnerError::Source(e) => format!("Could not load policies: {}", e),
            RunnerError::ThreadError { message } => {
                format!("Internal error while evaluating policies: {}", message)
            }
            RunnerError::ConfigurationError { reason } => {
                format!("Configuration error: {}", reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_unusable_is_fatal() {
        let error = RunnerError::CatalogUnusable(CatalogError::Unusable {
            reason: "empty".into(),
        });
        assert!(!error.is_recoverable());
        assert_eq!(error.log_code(), codes::catalog::CATALOG_UNUSABLE);
        assert!(error.user_message().contains("empty"));
    }

    #[test]
    fn test_configuration_error_is_recoverable() {
        let error = RunnerError::ConfigurationError {
            reason: "bad".into(),
        };
        assert!(error.is_recoverable());
    }
}
