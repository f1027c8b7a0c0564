use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Fatal catalog errors: the catalog cannot be used at all
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog '{path}' is {size} bytes, maximum is {max}")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Unsupported catalog format for '{path}' (expected .json or .toml)")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Catalog is unusable: {reason}")]
    Unusable { reason: String },
}

impl CatalogError {
    pub fn log_code(&self) -> crate::logging::Code {
        use crate::logging::codes::catalog;
        match self {
            CatalogError::Io { .. } | CatalogError::TooLarge { .. } => {
                catalog::CATALOG_READ_FAILURE
            }
            CatalogError::UnsupportedFormat { .. }
            | CatalogError::Json(_)
            | CatalogError::Toml(_) => catalog::CATALOG_PARSE_FAILURE,
            CatalogError::Unusable { .. } => catalog::CATALOG_UNUSABLE,
        }
    }
}

/// Kind of a non-fatal catalog problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    InvalidPath,
    UnknownOperator,
    InvalidExpectedValue,
    ShapeMismatch,
    DuplicateRequirement,
    UnknownPlatform,
    MissingField,
    UnknownRequirementReference,
}

impl IssueKind {
    /// Whether the affected requirement is still loaded
    pub fn keeps_requirement(&self) -> bool {
        matches!(
            self,
            IssueKind::ShapeMismatch | IssueKind::UnknownRequirementReference
        )
    }

    pub fn log_code(&self) -> crate::logging::Code {
        use crate::logging::codes::catalog;
        match self {
            IssueKind::InvalidPath => catalog::INVALID_PATH_EXPRESSION,
            IssueKind::ShapeMismatch => catalog::OPERATOR_SHAPE_MISMATCH,
            IssueKind::DuplicateRequirement => catalog::DUPLICATE_REQUIREMENT,
            IssueKind::UnknownRequirementReference => catalog::UNKNOWN_REFERENCE,
            IssueKind::UnknownOperator
            | IssueKind::InvalidExpectedValue
            | IssueKind::UnknownPlatform
            | IssueKind::MissingField => catalog::INVALID_REQUIREMENT_FIELD,
        }
    }
}

/// A problem found while compiling one catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogIssue {
    pub requirement_id: Option<String>,
    pub kind: IssueKind,
    pub message: String,
}

impl CatalogIssue {
    pub fn new(requirement_id: Option<&str>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            requirement_id: requirement_id.map(str::to_string),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requirement_id {
            Some(id) => write!(f, "[{}] {}: {}", self.kind.log_code(), id, self.message),
            None => write!(f, "[{}] {}", self.kind.log_code(), self.message),
        }
    }
}
