//! # Extraction Strategies
//!
//! Ordered strategies for locating a requirement's value inside a policy
//! payload, and the smart extractor that drives them.

pub mod alternate;
pub mod array_scan;
pub mod direct;
pub mod extractor;
pub mod registry;
pub mod template;
pub mod traits;

pub use alternate::AlternateNameStrategy;
pub use array_scan::{normalize_name, ArrayScanStrategy};
pub use direct::DirectPathStrategy;
pub use extractor::{incompatibility, is_compatible, SmartExtractor};
pub use registry::{StrategySet, StrategySetBuilder, StrategySetStatistics};
pub use template::TemplatePathStrategy;
pub use traits::{
    ConfidenceLevel, ExtractionContext, ExtractionMatch, ExtractionResult, ExtractionStrategy,
    SettingTarget, StrategyKind,
};
