//! Consolidated error codes and classification system
//!
//! Single source of truth for all log codes, their metadata, and classification functions.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub const fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// ERROR CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
    pub const CONFIGURATION_INVALID: Code = Code::new("ERR003");
}

/// Requirement catalog error codes
pub mod catalog {
    use super::Code;

    pub const CATALOG_READ_FAILURE: Code = Code::new("E010");
    pub const CATALOG_PARSE_FAILURE: Code = Code::new("E011");
    pub const CATALOG_UNUSABLE: Code = Code::new("E012");
    pub const INVALID_PATH_EXPRESSION: Code = Code::new("E013");
    pub const OPERATOR_SHAPE_MISMATCH: Code = Code::new("E014");
    pub const DUPLICATE_REQUIREMENT: Code = Code::new("E015");
    pub const UNKNOWN_REFERENCE: Code = Code::new("E016");
    pub const INVALID_REQUIREMENT_FIELD: Code = Code::new("E017");
}

/// Policy source error codes
pub mod source {
    use super::Code;

    pub const SOURCE_READ_FAILURE: Code = Code::new("E030");
    pub const POLICY_RECORD_INVALID: Code = Code::new("E031");
    pub const CACHE_REFRESH_FAILURE: Code = Code::new("E032");
}

/// Extraction error codes
pub mod extraction {
    use super::Code;

    pub const PAYLOAD_UNPARSEABLE: Code = Code::new("E040");
    pub const PAYLOAD_NOT_AN_OBJECT: Code = Code::new("E041");
}

/// Evaluation error codes
pub mod evaluation {
    use super::Code;

    pub const CONFIGURATION_ERROR: Code = Code::new("E050");
}

/// Batch runner error codes
pub mod runner {
    use super::Code;

    pub const POLICY_EVALUATION_PANIC: Code = Code::new("E060");
    pub const WORKER_THREAD_FAILURE: Code = Code::new("E061");
    pub const OUTPUT_WRITE_FAILURE: Code = Code::new("E062");
    pub const DUPLICATE_POLICY_ID: Code = Code::new("E063");
}

// ============================================================================
// SUCCESS CODE CONSTANTS
// ============================================================================

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const CATALOG_COMPILED: Code = Code::new("I010");
    pub const POLICIES_LOADED: Code = Code::new("I020");
    pub const CACHE_REFRESHED: Code = Code::new("I021");
    pub const POLICY_EVALUATED: Code = Code::new("I030");
    pub const AGGREGATION_COMPLETE: Code = Code::new("I040");
    pub const RUN_COMPLETED: Code = Code::new("I041");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

const REGISTERED_ERRORS: &[ErrorMetadata] = &[
    ErrorMetadata::new(
        "ERR001",
        "System",
        Severity::Critical,
        false,
        "Critical internal engine error",
        "File a bug report with the run log attached",
    ),
    ErrorMetadata::new(
        "ERR002",
        "System",
        Severity::Critical,
        false,
        "Logging or engine initialization failure",
        "Check configuration and environment variables",
    ),
    ErrorMetadata::new(
        "ERR003",
        "System",
        Severity::High,
        false,
        "Engine configuration is invalid",
        "Fix the configuration file or PSC_* environment variables",
    ),
    ErrorMetadata::new(
        "E010",
        "Catalog",
        Severity::High,
        false,
        "Requirement catalog could not be read",
        "Check the catalog path and file permissions",
    ),
    ErrorMetadata::new(
        "E011",
        "Catalog",
        Severity::High,
        false,
        "Requirement catalog could not be parsed",
        "Validate the catalog document against the catalog format",
    ),
    ErrorMetadata::new(
        "E012",
        "Catalog",
        Severity::Critical,
        false,
        "Requirement catalog contains no usable requirements",
        "Add at least one valid requirement before running an evaluation",
    ),
    ErrorMetadata::new(
        "E013",
        "Catalog",
        Severity::Medium,
        true,
        "Setting path expression is malformed",
        "Correct the path syntax; use ['key.with.dots'] for keys containing dots",
    ),
    ErrorMetadata::new(
        "E014",
        "Catalog",
        Severity::Medium,
        true,
        "Expected value shape is incompatible with the operator",
        "Change the expected value or operator so that they agree",
    ),
    ErrorMetadata::new(
        "E015",
        "Catalog",
        Severity::Medium,
        true,
        "Requirement id is declared more than once",
        "Give every requirement a unique id",
    ),
    ErrorMetadata::new(
        "E016",
        "Catalog",
        Severity::Low,
        true,
        "Control references a requirement that does not exist",
        "Remove the stale reference or add the missing requirement",
    ),
    ErrorMetadata::new(
        "E017",
        "Catalog",
        Severity::Medium,
        true,
        "Requirement field has an invalid value",
        "Correct the field according to the catalog format",
    ),
    ErrorMetadata::new(
        "E030",
        "Source",
        Severity::High,
        true,
        "Policy source could not be read",
        "Check the source location and permissions",
    ),
    ErrorMetadata::new(
        "E031",
        "Source",
        Severity::Medium,
        true,
        "Policy record is invalid and was skipped",
        "Inspect the exported policy record",
    ),
    ErrorMetadata::new(
        "E032",
        "Source",
        Severity::Medium,
        true,
        "Policy cache refresh failed",
        "Retry with a forced refresh or inspect the upstream source",
    ),
    ErrorMetadata::new(
        "E040",
        "Extraction",
        Severity::Medium,
        true,
        "Policy payload text is not valid JSON",
        "Re-export the policy from the management plane",
    ),
    ErrorMetadata::new(
        "E041",
        "Extraction",
        Severity::Low,
        true,
        "Policy payload is not a JSON object",
        "Confirm the payload belongs to a supported policy type",
    ),
    ErrorMetadata::new(
        "E050",
        "Evaluation",
        Severity::Medium,
        true,
        "Requirement could not be evaluated because of a catalog configuration error",
        "Fix the requirement definition in the catalog",
    ),
    ErrorMetadata::new(
        "E060",
        "Runner",
        Severity::High,
        true,
        "Evaluation of a single policy panicked and was isolated",
        "File a bug report with the offending policy payload",
    ),
    ErrorMetadata::new(
        "E061",
        "Runner",
        Severity::Critical,
        false,
        "Worker thread failed",
        "Reduce worker count and retry",
    ),
    ErrorMetadata::new(
        "E062",
        "Runner",
        Severity::High,
        true,
        "Run report could not be written",
        "Check the output path and permissions",
    ),
    ErrorMetadata::new(
        "E063",
        "Runner",
        Severity::Medium,
        true,
        "Several policies share one id and none of them were evaluated",
        "Give every exported policy a distinct id",
    ),
];

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        REGISTERED_ERRORS
            .iter()
            .map(|metadata| (metadata.code, metadata.clone()))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Look up metadata for a code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|m| m.severity)
        .unwrap_or(Severity::Low)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|m| m.recoverable)
        .unwrap_or(true)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|m| m.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|m| m.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    if let Some(metadata) = get_error_metadata(code) {
        return metadata.category;
    }
    match code.chars().next() {
        Some('I') => "Success",
        Some('W') => "Warning",
        Some('D') => "Debug",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_error_code_has_metadata() {
        let codes = [
            system::INTERNAL_ERROR,
            system::INITIALIZATION_FAILURE,
            system::CONFIGURATION_INVALID,
            catalog::CATALOG_READ_FAILURE,
            catalog::CATALOG_PARSE_FAILURE,
            catalog::CATALOG_UNUSABLE,
            catalog::INVALID_PATH_EXPRESSION,
            catalog::OPERATOR_SHAPE_MISMATCH,
            catalog::DUPLICATE_REQUIREMENT,
            catalog::UNKNOWN_REFERENCE,
            catalog::INVALID_REQUIREMENT_FIELD,
            source::SOURCE_READ_FAILURE,
            source::POLICY_RECORD_INVALID,
            source::CACHE_REFRESH_FAILURE,
            extraction::PAYLOAD_UNPARSEABLE,
            extraction::PAYLOAD_NOT_AN_OBJECT,
            evaluation::CONFIGURATION_ERROR,
            runner::POLICY_EVALUATION_PANIC,
            runner::WORKER_THREAD_FAILURE,
            runner::OUTPUT_WRITE_FAILURE,
            runner::DUPLICATE_POLICY_ID,
        ];

        for code in codes {
            assert!(
                get_error_metadata(code.as_str()).is_some(),
                "missing metadata for {}",
                code
            );
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(get_category("E014"), "Catalog");
        assert_eq!(get_severity("E012"), Severity::Critical);
        assert!(!is_recoverable("E061"));
        assert_eq!(get_category("I030"), "Success");
        assert_eq!(get_description("E999"), "Unknown error");
    }
}
