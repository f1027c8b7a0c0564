//! # Smart Extractor
//!
//! Runs the strategy set for (policy, requirement) pairs after filtering out
//! pairs whose template family or platform cannot apply.

use super::registry::StrategySet;
use super::traits::{ExtractionContext, ExtractionResult};
use crate::types::Policy;
use psc_catalog::catalog::{Catalog, Requirement};
use psc_catalog::log_debug;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Why a requirement does not apply to a policy
pub fn incompatibility(policy: &Policy, requirement: &Requirement) -> Option<String> {
    if let Some(wanted) = requirement.template_family.as_deref() {
        match policy.template_family.as_deref() {
            Some(actual) if actual.eq_ignore_ascii_case(wanted) => {}
            Some(actual) => {
                return Some(format!(
                    "requirement targets template family '{}', policy is '{}'",
                    wanted, actual
                ))
            }
            None => {
                return Some(format!(
                    "requirement targets template family '{}', policy family is unknown",
                    wanted
                ))
            }
        }
    }

    if let Some(wanted) = requirement.platform {
        match policy.platform {
            Some(actual) if actual == wanted => {}
            Some(actual) => {
                return Some(format!(
                    "requirement targets platform '{}', policy is '{}'",
                    wanted, actual
                ))
            }
            None => {
                return Some(format!(
                    "requirement targets platform '{}', policy platform is unknown",
                    wanted
                ))
            }
        }
    }

    None
}

pub fn is_compatible(policy: &Policy, requirement: &Requirement) -> bool {
    incompatibility(policy, requirement).is_none()
}

pub struct SmartExtractor {
    strategies: StrategySet,
    catalog: Arc<Catalog>,
}

impl SmartExtractor {
    pub fn new(strategies: StrategySet, catalog: Arc<Catalog>) -> Self {
        Self {
            strategies,
            catalog,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn strategies(&self) -> &StrategySet {
        &self.strategies
    }

    /// Diagnostic single-pair extraction
    ///
    /// Incompatible pairs and unparseable payloads come back as `NotFound`
    /// with the reason in the rationale.
    pub fn extract_one(&self, policy: &Policy, requirement: &Requirement) -> ExtractionResult {
        if let Some(reason) = incompatibility(policy, requirement) {
            return ExtractionResult::not_found(format!("not applicable: {}", reason));
        }
        match policy.document() {
            Ok(document) => self.extract_from(policy, &document, requirement),
            Err(e) => ExtractionResult::not_found(format!("payload is not valid JSON: {}", e)),
        }
    }

    /// Extract every compatible requirement, keyed by requirement id
    pub fn extract_batch(
        &self,
        policy: &Policy,
        requirements: &[Requirement],
    ) -> BTreeMap<String, ExtractionResult> {
        match policy.document() {
            Ok(document) => self.extract_batch_from(policy, &document, requirements),
            Err(e) => requirements
                .iter()
                .filter(|r| is_compatible(policy, r))
                .map(|r| {
                    (
                        r.id.clone(),
                        ExtractionResult::not_found(format!("payload is not valid JSON: {}", e)),
                    )
                })
                .collect(),
        }
    }

    /// Batch extraction over an already parsed payload
    pub fn extract_batch_from(
        &self,
        policy: &Policy,
        document: &Value,
        requirements: &[Requirement],
    ) -> BTreeMap<String, ExtractionResult> {
        let results: BTreeMap<String, ExtractionResult> = requirements
            .iter()
            .filter(|r| is_compatible(policy, r))
            .map(|r| (r.id.clone(), self.extract_from(policy, document, r)))
            .collect();

        log_debug!("Batch extraction finished",
            "policy_id" => policy.id,
            "candidates" => results.len(),
            "found" => results.values().filter(|r| r.is_found()).count()
        );
        results
    }

    fn extract_from(
        &self,
        policy: &Policy,
        document: &Value,
        requirement: &Requirement,
    ) -> ExtractionResult {
        let ctx = ExtractionContext {
            policy,
            document,
            profile: policy
                .template_family
                .as_deref()
                .and_then(|family| self.catalog.family(family)),
            matching: self.catalog.matching(),
        };
        self.strategies.extract(&ctx, requirement)
    }
}

impl std::fmt::Debug for SmartExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmartExtractor")
            .field("strategies", &self.strategies)
            .field("requirements", &self.catalog.requirements().len())
            .finish()
    }
}
