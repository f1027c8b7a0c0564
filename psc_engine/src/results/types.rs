//! # Compliance Result Types
//!
//! Setting-level checks, per-policy and per-control summaries and gap
//! records. Everything here serializes to JSON for downstream reporting.

use crate::strategies::{ConfidenceLevel, ExtractionResult};
use crate::types::{Policy, PolicyType, SettingValue};
use chrono::{DateTime, Utc};
use psc_catalog::catalog::{AuthoringConfidence, ExpectedValue, Operator, Requirement};
use psc_catalog::Platform;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Setting-level checks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Compliant,
    NonCompliant,
    NotExtracted,
    ConfigurationError,
}

impl CheckStatus {
    /// A value was located and judged
    pub fn is_extracted(&self) -> bool {
        matches!(self, CheckStatus::Compliant | CheckStatus::NonCompliant)
    }

    /// Counts towards `total_checks`
    pub fn is_counted(&self) -> bool {
        !matches!(self, CheckStatus::ConfigurationError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Compliant => "compliant",
            CheckStatus::NonCompliant => "non_compliant",
            CheckStatus::NotExtracted => "not_extracted",
            CheckStatus::ConfigurationError => "configuration_error",
        }
    }
}

/// Verdict for one (policy, requirement) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceCheck {
    pub policy_id: String,
    pub policy_name: String,
    pub requirement_id: String,
    pub requirement_name: String,
    pub setting_name: String,
    /// `None` whenever nothing was extracted
    pub actual_value: Option<SettingValue>,
    pub expected_value: ExpectedValue,
    pub operator: Operator,
    pub is_compliant: bool,
    pub status: CheckStatus,
    pub last_checked: DateTime<Utc>,
    pub error_message: Option<String>,
    pub matched_path: Option<String>,
    pub strategy: String,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub authoring_confidence: AuthoringConfidence,
    pub rationale: String,
}

impl ComplianceCheck {
    /// Check skeleton carrying the extraction diagnostics
    pub(crate) fn from_extraction(
        policy: &Policy,
        requirement: &Requirement,
        extraction: &ExtractionResult,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            policy_id: policy.id.clone(),
            policy_name: policy.name.clone(),
            requirement_id: requirement.id.clone(),
            requirement_name: requirement.name.clone(),
            setting_name: requirement.setting_name().to_string(),
            actual_value: extraction.value().cloned(),
            expected_value: requirement.expected_value.clone(),
            operator: requirement.operator,
            is_compliant: false,
            status: CheckStatus::NotExtracted,
            last_checked: checked_at,
            error_message: None,
            matched_path: extraction.matched_path().map(str::to_string),
            strategy: extraction.strategy_name().to_string(),
            confidence: extraction.confidence(),
            confidence_level: extraction.confidence_level(),
            authoring_confidence: requirement.confidence,
            rationale: extraction.rationale().to_string(),
        }
    }
}

// ============================================================================
// Per-policy summary
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicySummary {
    pub policy_id: String,
    pub policy_name: String,
    pub policy_type: PolicyType,
    pub template_family: Option<String>,
    pub platform: Option<Platform>,
    /// Checks excluding configuration errors
    pub total_checks: usize,
    pub extracted_count: usize,
    pub compliant_count: usize,
    pub non_compliant_count: usize,
    pub configuration_errors: usize,
    /// Percentage of counted checks with an extracted value
    pub extraction_rate: f64,
}

impl PolicySummary {
    pub fn new(policy: &Policy) -> Self {
        Self {
            policy_id: policy.id.clone(),
            policy_name: policy.name.clone(),
            policy_type: policy.policy_type,
            template_family: policy.template_family.clone(),
            platform: policy.platform,
            total_checks: 0,
            extracted_count: 0,
            compliant_count: 0,
            non_compliant_count: 0,
            configuration_errors: 0,
            extraction_rate: 0.0,
        }
    }

    pub fn record(&mut self, status: CheckStatus) {
        match status {
            CheckStatus::Compliant => {
                self.total_checks += 1;
                self.extracted_count += 1;
                self.compliant_count += 1;
            }
            CheckStatus::NonCompliant => {
                self.total_checks += 1;
                self.extracted_count += 1;
                self.non_compliant_count += 1;
            }
            CheckStatus::NotExtracted => self.total_checks += 1,
            CheckStatus::ConfigurationError => self.configuration_errors += 1,
        }
        self.extraction_rate = percentage(self.extracted_count, self.total_checks);
    }

    /// Percentage of extracted checks that are compliant
    pub fn compliance_rate(&self) -> f64 {
        percentage(self.compliant_count, self.extracted_count)
    }
}

// ============================================================================
// Per-control summary
// ============================================================================

/// How one mapped requirement stands across all candidate policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementState {
    /// At least one compliant check
    Satisfied,
    /// Extracted somewhere, never compliant
    Failing,
    /// Never extracted
    Missing,
    /// Catalog defect; reported but outside every denominator
    Misconfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    FullyCovered,
    PartiallyCovered,
    NonCompliant,
    NotCovered,
    /// Every mapped requirement is misconfigured
    Indeterminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementCoverage {
    pub requirement_id: String,
    pub state: RequirementState,
    pub compliant_checks: usize,
    pub non_compliant_checks: usize,
    pub not_extracted_checks: usize,
    pub configuration_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSummary {
    pub control_id: String,
    pub title: Option<String>,
    pub family: Option<String>,
    pub coverage: CoverageStatus,
    /// Evaluable requirements only
    pub requirement_count: usize,
    pub satisfied_requirements: usize,
    pub failing_requirements: usize,
    pub missing_requirements: usize,
    pub misconfigured_requirements: usize,
    pub requirements: Vec<RequirementCoverage>,
}

// ============================================================================
// Gaps
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GapType {
    NoSettings,
    NonCompliantSettings,
}

impl GapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GapType::NoSettings => "NoSettings",
            GapType::NonCompliantSettings => "NonCompliantSettings",
        }
    }
}

/// A control shortfall specific enough to drive one remediation item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlGap {
    pub gap_id: String,
    pub control_id: String,
    pub control_title: Option<String>,
    pub gap_type: GapType,
    pub policy_id: Option<String>,
    pub policy_name: Option<String>,
    pub requirement_id: Option<String>,
    pub setting_name: Option<String>,
    pub actual_value: Option<SettingValue>,
    pub expected_value: Option<ExpectedValue>,
    pub authoring_confidence: Option<AuthoringConfidence>,
    pub recommended_actions: Vec<String>,
}

impl ControlGap {
    /// Deterministic id derived from the gap's identifying fields
    pub fn derive_id(
        control_id: &str,
        gap_type: GapType,
        policy_id: Option<&str>,
        requirement_id: Option<&str>,
    ) -> String {
        let namespace = Uuid::new_v5(&Uuid::NAMESPACE_URL, b"urn:psc:control-gap");
        let key = format!(
            "{}|{}|{}|{}",
            control_id,
            gap_type.as_str(),
            policy_id.unwrap_or(""),
            requirement_id.unwrap_or("")
        );
        Uuid::new_v5(&namespace, key.as_bytes()).to_string()
    }

    pub fn new(control_id: impl Into<String>, gap_type: GapType) -> Self {
        let control_id = control_id.into();
        Self {
            gap_id: Self::derive_id(&control_id, gap_type, None, None),
            control_id,
            control_title: None,
            gap_type,
            policy_id: None,
            policy_name: None,
            requirement_id: None,
            setting_name: None,
            actual_value: None,
            expected_value: None,
            authoring_confidence: None,
            recommended_actions: Vec::new(),
        }
    }

    pub fn with_control_title(mut self, title: Option<String>) -> Self {
        self.control_title = title;
        self
    }

    pub fn with_policy(mut self, policy_id: &str, policy_name: &str) -> Self {
        self.policy_id = Some(policy_id.to_string());
        self.policy_name = Some(policy_name.to_string());
        self.refresh_id();
        self
    }

    pub fn with_requirement(mut self, requirement: &Requirement) -> Self {
        self.requirement_id = Some(requirement.id.clone());
        self.setting_name = Some(requirement.setting_name().to_string());
        self.expected_value = Some(requirement.expected_value.clone());
        self.authoring_confidence = Some(requirement.confidence);
        self.refresh_id();
        self
    }

    pub fn with_actual_value(mut self, value: Option<SettingValue>) -> Self {
        self.actual_value = value;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.recommended_actions.push(action.into());
        self
    }

    fn refresh_id(&mut self) {
        self.gap_id = Self::derive_id(
            &self.control_id,
            self.gap_type,
            self.policy_id.as_deref(),
            self.requirement_id.as_deref(),
        );
    }
}

// ============================================================================
// Run-level summary
// ============================================================================

/// A policy that could not be evaluated at all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyFailure {
    pub policy_id: String,
    pub policy_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub policies_processed: usize,
    pub policies_failed: usize,
    pub total_checks: usize,
    pub extracted_checks: usize,
    pub compliant_checks: usize,
    pub non_compliant_checks: usize,
    pub not_extracted_checks: usize,
    pub configuration_errors: usize,
    /// Setting-level: extracted / total checks, as a percentage
    pub extraction_rate: f64,
    pub total_controls: usize,
    pub fully_covered: usize,
    pub partially_covered: usize,
    pub non_compliant_controls: usize,
    pub not_covered: usize,
    pub indeterminate_controls: usize,
    /// Control-level: fully covered / determinate controls, as a percentage
    pub coverage_percentage: f64,
    pub gap_count: usize,
}

/// `part / whole * 100`, zero for an empty whole
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
