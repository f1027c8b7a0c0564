//! # Requirement Catalog
//!
//! Authored catalog documents, their compilation into executable
//! requirements, and the control registry built alongside.

mod compiler;
mod controls;
mod document;
mod error;
mod expected;
mod families;
mod operator;
mod requirement;

pub use compiler::{Catalog, CatalogCompilation};
pub use controls::{Control, ControlRegistry, ControlSpec};
pub use document::{CatalogDocument, CatalogFormat};
pub use error::{CatalogError, CatalogIssue, IssueKind};
pub use expected::{
    canonical_number, parse_bool_text, ExpectedValue, InvalidExpectedValue, NumericRange,
};
pub use families::{ArrayScanConfig, TemplateFamilyProfile};
pub use operator::{Operator, ShapeMismatch};
pub use requirement::{AuthoringConfidence, Platform, Requirement, RequirementSpec};
