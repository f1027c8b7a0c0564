//! Policy source errors

use psc_catalog::logging::{codes, Code};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot walk '{path}': {reason}")]
    Walk { path: PathBuf, reason: String },

    #[error("Policy file '{path}' is {size} bytes, limit is {max}")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Invalid policy export '{path}': {reason}")]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Source unavailable: {reason}")]
    Unavailable { reason: String },
}

impl SourceError {
    /// A retry against the same source may succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SourceError::Io { .. } | SourceError::Unavailable { .. })
    }

    pub fn log_code(&self) -> Code {
        match self {
            SourceError::Io { .. } | SourceError::Walk { .. } | SourceError::Unavailable { .. } => {
                codes::source::SOURCE_READ_FAILURE
            }
            SourceError::TooLarge { .. } | SourceError::InvalidRecord { .. } => {
                codes::source::POLICY_RECORD_INVALID
            }
        }
    }
}
