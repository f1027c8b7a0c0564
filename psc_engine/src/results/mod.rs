//! # Compliance Results
//!
//! Check and summary types, the aggregator and the run report.

pub mod aggregator;
pub mod report;
pub mod types;

pub use aggregator::{classify_coverage, Aggregation, ComplianceAggregator};
pub use report::{HostContext, RunMetadata, RunOutcome, RunReport};
pub use types::{
    percentage, CheckStatus, ComplianceCheck, ControlGap, ControlSummary, CoverageStatus,
    GapType, PolicyFailure, PolicySummary, RequirementCoverage, RequirementState, RunSummary,
};
