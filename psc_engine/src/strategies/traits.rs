//! Extraction strategy contract and result types

use crate::types::{Policy, SettingValue};
use psc_catalog::catalog::{ArrayScanConfig, Requirement, TemplateFamilyProfile};
use psc_catalog::config::compile_time::extraction::{
    HIGH_CONFIDENCE_THRESHOLD, MEDIUM_CONFIDENCE_THRESHOLD,
};
use psc_catalog::path::PathExpr;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

// ============================================================================
// Result types
// ============================================================================

/// Strategy that located a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    DirectPath,
    TemplatePath,
    ArrayScan,
    AlternateName,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::DirectPath => "direct_path",
            StrategyKind::TemplatePath => "template_path",
            StrategyKind::ArrayScan => "array_scan",
            StrategyKind::AlternateName => "alternate_name",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Banded extraction confidence for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    None,
}

impl ConfidenceLevel {
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::High
        } else if confidence >= MEDIUM_CONFIDENCE_THRESHOLD {
            ConfidenceLevel::Medium
        } else if confidence > 0.0 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::None
        }
    }
}

/// A located value with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionMatch {
    pub value: SettingValue,
    /// Concrete path the value was read from
    pub path: String,
    pub strategy: StrategyKind,
    pub confidence: f64,
    pub rationale: String,
}

/// Outcome of extracting one requirement from one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtractionResult {
    Found(ExtractionMatch),
    NotFound { rationale: String },
}

impl ExtractionResult {
    pub fn not_found(rationale: impl Into<String>) -> Self {
        ExtractionResult::NotFound {
            rationale: rationale.into(),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ExtractionResult::Found(_))
    }

    pub fn found(&self) -> Option<&ExtractionMatch> {
        match self {
            ExtractionResult::Found(m) => Some(m),
            ExtractionResult::NotFound { .. } => None,
        }
    }

    pub fn value(&self) -> Option<&SettingValue> {
        self.found().map(|m| &m.value)
    }

    pub fn matched_path(&self) -> Option<&str> {
        self.found().map(|m| m.path.as_str())
    }

    /// Strategy name, `none` for a miss
    pub fn strategy_name(&self) -> &'static str {
        self.found().map(|m| m.strategy.as_str()).unwrap_or("none")
    }

    pub fn confidence(&self) -> f64 {
        self.found().map(|m| m.confidence).unwrap_or(0.0)
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        ConfidenceLevel::from_score(self.confidence())
    }

    pub fn rationale(&self) -> &str {
        match self {
            ExtractionResult::Found(m) => &m.rationale,
            ExtractionResult::NotFound { rationale } => rationale,
        }
    }
}

// ============================================================================
// Strategy contract
// ============================================================================

/// Everything a strategy may look at for one policy
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub policy: &'a Policy,
    pub document: &'a Value,
    /// Profile of the policy's template family, when the catalog knows it
    pub profile: Option<&'a TemplateFamilyProfile>,
    pub matching: &'a ArrayScanConfig,
}

/// What to look for: a path and a setting name on behalf of a requirement
///
/// The primary target uses the requirement's own path and setting name;
/// the alternate-name strategy builds further targets from its synonyms.
#[derive(Debug, Clone, Copy)]
pub struct SettingTarget<'a> {
    pub path: &'a PathExpr,
    pub name: &'a str,
    pub requirement: &'a Requirement,
}

impl<'a> SettingTarget<'a> {
    pub fn primary(requirement: &'a Requirement) -> Self {
        Self {
            path: &requirement.setting_path,
            name: requirement.setting_name(),
            requirement,
        }
    }
}

/// One way of locating a setting value inside a payload
///
/// Implementations must be total: malformed or unexpected payload shapes
/// yield `None`, never a panic.
pub trait ExtractionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Confidence attached to values this strategy finds
    fn confidence(&self) -> f64;

    fn attempt(&self, ctx: &ExtractionContext<'_>, target: &SettingTarget<'_>)
        -> Option<ExtractionMatch>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceLevel::from_score(1.0), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.3), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0.0), ConfidenceLevel::None);
    }

    #[test]
    fn test_not_found_sentinel() {
        let miss = ExtractionResult::not_found("nothing at 'a.b'");
        assert!(!miss.is_found());
        assert_eq!(miss.value(), None);
        assert_eq!(miss.strategy_name(), "none");
        assert_eq!(miss.confidence(), 0.0);
        assert_eq!(miss.matched_path(), None);
        assert_eq!(miss.rationale(), "nothing at 'a.b'");
    }
}
