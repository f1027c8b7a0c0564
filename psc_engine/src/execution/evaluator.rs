//! # Compliance Evaluator
//!
//! Turns an extraction result into a [`ComplianceCheck`]. A miss becomes
//! `NotExtracted` with no actual value; a requirement whose operator cannot
//! evaluate its expected value becomes `ConfigurationError`.

use super::error::EvaluationError;
use super::operators::{evaluate, EvaluationOptions};
use crate::results::{CheckStatus, ComplianceCheck};
use crate::strategies::ExtractionResult;
use crate::types::Policy;
use chrono::{DateTime, Utc};
use psc_catalog::catalog::Requirement;
use psc_catalog::log_warning;

#[derive(Debug, Clone, Copy, Default)]
pub struct ComplianceEvaluator;

impl ComplianceEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Build the check for one (policy, requirement) pair
    pub fn evaluate_check(
        &self,
        policy: &Policy,
        requirement: &Requirement,
        extraction: &ExtractionResult,
        checked_at: DateTime<Utc>,
    ) -> ComplianceCheck {
        let mut check =
            ComplianceCheck::from_extraction(policy, requirement, extraction, checked_at);

        // Shape errors are reported whether or not a value was found
        if let Some(mismatch) = requirement.shape_error() {
            let error = EvaluationError::from(mismatch);
            log_warning!(code = error.log_code(), "Requirement cannot be evaluated",
                "requirement_id" => requirement.id,
                "policy_id" => policy.id,
                "reason" => error
            );
            check.status = CheckStatus::ConfigurationError;
            check.error_message = Some(error.to_string());
            return check;
        }

        let Some(actual) = extraction.value() else {
            return check;
        };

        let options = EvaluationOptions::case_insensitive(requirement.case_insensitive);
        match evaluate(actual, &requirement.expected_value, requirement.operator, options) {
            Ok(true) => {
                check.is_compliant = true;
                check.status = CheckStatus::Compliant;
            }
            Ok(false) => check.status = CheckStatus::NonCompliant,
            Err(error) => {
                log_warning!(code = error.log_code(), "Requirement cannot be evaluated",
                    "requirement_id" => requirement.id,
                    "policy_id" => policy.id,
                    "reason" => error
                );
                check.status = CheckStatus::ConfigurationError;
                check.error_message = Some(error.to_string());
            }
        }
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::{ExtractionMatch, StrategyKind};
    use crate::types::SettingValue;
    use chrono::TimeZone;
    use psc_catalog::catalog::{ExpectedValue, NumericRange};
    use psc_catalog::path::PathExpr;
    use psc_catalog::Operator;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn found(value: SettingValue) -> ExtractionResult {
        ExtractionResult::Found(ExtractionMatch {
            value,
            path: "passwordMinimumLength".into(),
            strategy: StrategyKind::DirectPath,
            confidence: 1.0,
            rationale: "direct".into(),
        })
    }

    fn min_length() -> Requirement {
        Requirement::new(
            "REQ-PIN",
            "PIN length",
            PathExpr::key("passwordMinimumLength"),
            Operator::NumericRange,
            ExpectedValue::Range(NumericRange::at_least(6.0)),
        )
    }

    #[test]
    fn test_compliant_and_non_compliant() {
        let policy = Policy::new("p", "P", json!({}));
        let evaluator = ComplianceEvaluator::new();

        let ok = evaluator.evaluate_check(
            &policy,
            &min_length(),
            &found(SettingValue::Integer(8)),
            at(),
        );
        assert_eq!(ok.status, CheckStatus::Compliant);
        assert!(ok.is_compliant);
        assert_eq!(ok.strategy, "direct_path");
        assert_eq!(ok.last_checked, at());

        let short = evaluator.evaluate_check(
            &policy,
            &min_length(),
            &found(SettingValue::Integer(4)),
            at(),
        );
        assert_eq!(short.status, CheckStatus::NonCompliant);
        assert_eq!(short.actual_value, Some(SettingValue::Integer(4)));
    }

    #[test]
    fn test_miss_has_no_actual_value() {
        let policy = Policy::new("p", "P", json!({}));
        let check = ComplianceEvaluator::new().evaluate_check(
            &policy,
            &min_length(),
            &ExtractionResult::not_found("nothing"),
            at(),
        );
        assert_eq!(check.status, CheckStatus::NotExtracted);
        assert_eq!(check.actual_value, None);
        assert_eq!(check.strategy, "none");
        assert!(!check.is_compliant);
    }

    #[test]
    fn test_shape_mismatch_is_configuration_error() {
        let policy = Policy::new("p", "P", json!({}));
        let broken = Requirement {
            expected_value: ExpectedValue::Text("six".into()),
            ..min_length()
        };
        let check = ComplianceEvaluator::new().evaluate_check(
            &policy,
            &broken,
            &found(SettingValue::Integer(8)),
            at(),
        );
        assert_eq!(check.status, CheckStatus::ConfigurationError);
        assert!(check.error_message.is_some());
        assert!(!check.status.is_counted());
    }
}
