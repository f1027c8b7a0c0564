//! # PSC Catalog
//!
//! Requirement catalog compiler for the policy settings compliance engine.
//! Parses authored catalogs (JSON or TOML), compiles setting paths into typed
//! [`PathExpr`] values, checks operator/expected-value compatibility and builds
//! the control registry. Also hosts the shared logging system and configuration
//! layer used by every crate in the workspace.

pub mod catalog;
pub mod config;
#[macro_use]
pub mod logging;
pub mod path;

// Re-export key types for library consumers
pub use catalog::{
    ArrayScanConfig, AuthoringConfidence, Catalog, CatalogCompilation, CatalogDocument,
    CatalogError, CatalogIssue, Control, ControlRegistry, ControlSpec, ExpectedValue, IssueKind,
    NumericRange, Operator, Platform, Requirement, RequirementSpec, ShapeMismatch,
    TemplateFamilyProfile,
};
pub use config::{ConfigError, EngineConfig};
pub use path::{is_generic_key, PathError, PathExpr, PathSegment};
