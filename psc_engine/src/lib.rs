//! # PSC Engine - Policy Settings Compliance Engine
//!
//! Locates the settings a requirement catalog asks about inside exported
//! policy payloads, judges each one, and rolls the verdicts up into policy
//! summaries, control coverage and gaps.

pub mod api;
pub mod execution;
pub mod resolution;
pub mod results;
pub mod sources;
pub mod strategies;
pub mod types;

// Convenience re-exports
pub use api::*;
pub use execution::{ComplianceEvaluator, EvaluationError, EvaluationOptions};
pub use results::{
    CheckStatus, ComplianceCheck, ControlGap, ControlSummary, CoverageStatus, GapType,
    PolicyFailure, PolicySummary, RunOutcome, RunReport, RunSummary,
};
pub use sources::{
    CachedPolicySource, DirectoryPolicySource, InMemoryPolicySource, PolicyBatch, PolicySource,
    RefreshMode, SourceError,
};
pub use strategies::{ExtractionResult, ExtractionStrategy, SmartExtractor, StrategySet};
pub use types::{Policy, PolicyType, SettingValue};

pub mod prelude {
    pub use crate::api::{BatchRunner, RunnerConfig, RunnerError};

    pub use crate::results::{
        CheckStatus, ComplianceCheck, ControlGap, CoverageStatus, GapType, RunReport, RunSummary,
    };

    pub use crate::sources::{
        CachedPolicySource, DirectoryPolicySource, InMemoryPolicySource, PolicyBatch,
        PolicySource, RefreshMode,
    };

    pub use crate::strategies::{
        ExtractionContext, ExtractionMatch, ExtractionResult, ExtractionStrategy, SmartExtractor,
        StrategyKind, StrategySet,
    };

    pub use crate::types::{Policy, PolicyType, SettingValue};

    pub use psc_catalog::{Catalog, CatalogCompilation, Requirement};
}
