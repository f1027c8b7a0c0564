//! # Batch Runner
//!
//! Evaluates every policy against the catalog on a bounded set of scoped
//! worker threads, then aggregates once all checks exist.
//!
//! Policies are classified and sorted by id before being split into
//! contiguous slices, so worker scheduling never changes the outcome. A
//! policy whose payload text cannot be parsed, or whose evaluation panics,
//! is recorded as a [`PolicyFailure`] and the batch continues. Records a
//! source rejected, and every policy sharing an id with another, are
//! failures too.

use super::config::RunnerConfig;
use super::errors::RunnerError;
use crate::execution::ComplianceEvaluator;
use crate::results::{
    ComplianceAggregator, ComplianceCheck, PolicyFailure, RunMetadata, RunOutcome, RunReport,
};
use crate::sources::{PolicyBatch, PolicySource};
use crate::strategies::{SmartExtractor, StrategySet};
use crate::types::Policy;
use chrono::{DateTime, Utc};
use psc_catalog::catalog::{Catalog, CatalogIssue};
use psc_catalog::logging::{self, codes};
use psc_catalog::{log_error, log_info, log_success, log_warning};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

type PolicyOutcome = Result<Vec<ComplianceCheck>, PolicyFailure>;

pub struct BatchRunner {
    catalog: Arc<Catalog>,
    extractor: SmartExtractor,
    evaluator: ComplianceEvaluator,
    config: RunnerConfig,
    configuration_issues: Vec<CatalogIssue>,
}

impl BatchRunner {
    pub fn new(catalog: Arc<Catalog>, strategies: StrategySet, config: RunnerConfig) -> Self {
        Self {
            extractor: SmartExtractor::new(strategies, Arc::clone(&catalog)),
            catalog,
            evaluator: ComplianceEvaluator::new(),
            config,
            configuration_issues: Vec::new(),
        }
    }

    /// Standard strategies and default runner configuration
    pub fn with_defaults(catalog: Arc<Catalog>) -> Self {
        Self::new(catalog, StrategySet::standard(), RunnerConfig::default())
    }

    /// Catalog issues to carry into every report
    pub fn with_configuration_issues(mut self, issues: Vec<CatalogIssue>) -> Self {
        self.configuration_issues = issues;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn extractor(&self) -> &SmartExtractor {
        &self.extractor
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Fetch from `source` and run
    pub fn run_source(&self, source: &dyn PolicySource) -> Result<RunReport, RunnerError> {
        let batch = source.fetch_batch()?;
        self.run_batch(&batch)
    }

    pub fn run_all(&self, policies: &[Policy]) -> Result<RunReport, RunnerError> {
        self.run_all_at(policies, Utc::now())
    }

    /// Run with a fixed evaluation timestamp; identical inputs give an identical outcome
    pub fn run_all_at(
        &self,
        policies: &[Policy],
        evaluated_at: DateTime<Utc>,
    ) -> Result<RunReport, RunnerError> {
        self.run_inner(policies, &[], evaluated_at)
    }

    /// Run a source batch; its rejected records count as failed policies
    pub fn run_batch(&self, batch: &PolicyBatch) -> Result<RunReport, RunnerError> {
        self.run_batch_at(batch, Utc::now())
    }

    pub fn run_batch_at(
        &self,
        batch: &PolicyBatch,
        evaluated_at: DateTime<Utc>,
    ) -> Result<RunReport, RunnerError> {
        self.run_inner(&batch.policies, &batch.rejected, evaluated_at)
    }

    fn run_inner(
        &self,
        policies: &[Policy],
        rejected: &[PolicyFailure],
        evaluated_at: DateTime<Utc>,
    ) -> Result<RunReport, RunnerError> {
        if let Err(e) = self.catalog.ensure_usable() {
            log_error!(codes::catalog::CATALOG_UNUSABLE, "Refusing run",
                "reason" => e
            );
            return Err(RunnerError::CatalogUnusable(e));
        }

        let mut classified: Vec<Policy> = policies
            .iter()
            .cloned()
            .map(|p| p.classify(self.catalog.families()))
            .collect();
        classified.sort_by(|a, b| a.id.cmp(&b.id));

        let mut failures = rejected.to_vec();
        let (classified, mut duplicates) = split_duplicate_ids(classified);
        failures.append(&mut duplicates);

        let workers = self.config.max_workers.min(classified.len()).max(1);
        let mut metadata = RunMetadata::new(self.catalog.version(), evaluated_at, workers);

        log_info!("Starting compliance run",
            "run_id" => metadata.run_id,
            "policies" => classified.len(),
            "requirements" => self.catalog.requirements().len(),
            "workers" => workers
        );

        let outcomes = self.evaluate_parallel(&classified, evaluated_at, workers)?;

        let mut evaluated = Vec::with_capacity(classified.len());
        let mut checks = Vec::new();
        for (policy, outcome) in classified.into_iter().zip(outcomes) {
            match outcome {
                Ok(mut policy_checks) => {
                    checks.append(&mut policy_checks);
                    evaluated.push(policy);
                }
                Err(failure) => failures.push(failure),
            }
        }

        failures.sort_by(|a, b| {
            (&a.policy_id, &a.policy_name, &a.reason).cmp(&(
                &b.policy_id,
                &b.policy_name,
                &b.reason,
            ))
        });

        let aggregation =
            ComplianceAggregator::new(&self.catalog).aggregate(&evaluated, &checks, failures.len());
        let outcome = RunOutcome::new(
            aggregation,
            checks,
            failures,
            self.configuration_issues.clone(),
        );
        metadata.complete();

        log_success!(codes::success::RUN_COMPLETED, "Compliance run completed",
            "run_id" => metadata.run_id,
            "policies_processed" => outcome.summary.policies_processed,
            "policies_failed" => outcome.summary.policies_failed,
            "checks" => outcome.summary.total_checks,
            "coverage_percent" => format!("{:.1}", outcome.summary.coverage_percentage),
            "duration_ms" => metadata.duration_ms
        );

        Ok(RunReport { metadata, outcome })
    }

    /// Contiguous slices on scoped threads; results come back in input order
    fn evaluate_parallel(
        &self,
        policies: &[Policy],
        evaluated_at: DateTime<Utc>,
        workers: usize,
    ) -> Result<Vec<PolicyOutcome>, RunnerError> {
        if policies.is_empty() {
            return Ok(Vec::new());
        }
        let chunk_size = (policies.len() + workers - 1) / workers;

        thread::scope(|scope| {
            let handles: Vec<_> = policies
                .chunks(chunk_size)
                .enumerate()
                .map(|(worker_id, chunk)| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|policy| {
                                logging::with_policy_context(&policy.id, worker_id, || {
                                    self.evaluate_isolated(policy, evaluated_at)
                                })
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut outcomes = Vec::with_capacity(policies.len());
            for handle in handles {
                let mut batch = handle.join().map_err(|_| {
                    log_error!(codes::runner::WORKER_THREAD_FAILURE, "Worker thread panicked");
                    RunnerError::ThreadError {
                        message: "worker thread panicked outside policy isolation".to_string(),
                    }
                })?;
                outcomes.append(&mut batch);
            }
            Ok(outcomes)
        })
    }

    fn evaluate_isolated(&self, policy: &Policy, evaluated_at: DateTime<Utc>) -> PolicyOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.evaluate_policy(policy, evaluated_at))) {
            Ok(outcome) => outcome,
            Err(cause) => {
                let reason = cause
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| cause.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log_error!(codes::runner::POLICY_EVALUATION_PANIC, "Policy evaluation panicked",
                    "policy_id" => policy.id,
                    "reason" => reason
                );
                Err(PolicyFailure {
                    policy_id: policy.id.clone(),
                    policy_name: policy.name.clone(),
                    reason: format!("evaluation panicked: {}", reason),
                })
            }
        }
    }

    /// All checks for one policy, in requirement id order
    pub fn evaluate_policy(&self, policy: &Policy, evaluated_at: DateTime<Utc>) -> PolicyOutcome {
        let document = policy.document().map_err(|e| {
            log_error!(codes::extraction::PAYLOAD_UNPARSEABLE, "Policy payload is not valid JSON",
                "policy_id" => policy.id,
                "reason" => e
            );
            PolicyFailure {
                policy_id: policy.id.clone(),
                policy_name: policy.name.clone(),
                reason: format!("payload is not valid JSON: {}", e),
            }
        })?;

        if !document.is_object() {
            log_warning!(code = codes::extraction::PAYLOAD_NOT_AN_OBJECT,
                "Policy payload is not an object; every setting will be absent",
                "policy_id" => policy.id
            );
        }

        let extractions =
            self.extractor
                .extract_batch_from(policy, &document, self.catalog.requirements());

        let checks: Vec<ComplianceCheck> = extractions
            .iter()
            .filter_map(|(requirement_id, extraction)| {
                let requirement = self.catalog.requirement(requirement_id)?;
                Some(
                    self.evaluator
                        .evaluate_check(policy, requirement, extraction, evaluated_at),
                )
            })
            .collect();

        log_success!(codes::success::POLICY_EVALUATED, "Policy evaluated",
            "policy_id" => policy.id,
            "checks" => checks.len(),
            "extracted" => checks.iter().filter(|c| c.status.is_extracted()).count()
        );
        Ok(checks)
    }
}

/// Separate policies whose id is unique from those sharing one
///
/// Expects `policies` sorted by id. Every holder of a shared id is rejected,
/// so the outcome never depends on which copy arrived first.
fn split_duplicate_ids(policies: Vec<Policy>) -> (Vec<Policy>, Vec<PolicyFailure>) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for policy in &policies {
        *counts.entry(policy.id.clone()).or_default() += 1;
    }

    let mut unique = Vec::with_capacity(policies.len());
    let mut rejected = Vec::new();
    for policy in policies {
        let count = counts.get(&policy.id).copied().unwrap_or(0);
        if count > 1 {
            log_error!(codes::runner::DUPLICATE_POLICY_ID, "Policy id is not unique",
                "policy_id" => policy.id,
                "occurrences" => count
            );
            rejected.push(PolicyFailure {
                reason: format!("policy id '{}' appears {} times", policy.id, count),
                policy_id: policy.id,
                policy_name: policy.name,
            });
        } else {
            unique.push(policy);
        }
    }
    (unique, rejected)
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("extractor", &self.extractor)
            .field("config", &self.config)
            .field("configuration_issues", &self.configuration_issues.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{CheckStatus, CoverageStatus, GapType};
    use crate::sources::{DirectoryPolicySource, InMemoryPolicySource};
    use crate::strategies::{
        ExtractionContext, ExtractionMatch, ExtractionStrategy, SettingTarget, StrategyKind,
    };
    use crate::types::SettingValue;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use psc_catalog::catalog::{CatalogError, ExpectedValue, NumericRange, Requirement};
    use psc_catalog::path::PathExpr;
    use psc_catalog::Operator;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn catalog() -> Arc<Catalog> {
        Arc::new(Catalog::from_requirements(vec![
            Requirement::new(
                "REQ-BL",
                "BitLocker",
                PathExpr::key("bitLockerEnabled"),
                Operator::Boolean,
                ExpectedValue::Boolean(true),
            )
            .with_controls(&["SC-28"]),
            Requirement::new(
                "REQ-PIN",
                "PIN length",
                PathExpr::key("passwordMinimumLength"),
                Operator::NumericRange,
                ExpectedValue::Range(NumericRange::at_least(6.0)),
            )
            .with_controls(&["IA-5"]),
        ]))
    }

    fn policies() -> Vec<Policy> {
        vec![
            Policy::new("p3", "Three", json!({"bitLockerEnabled": false})),
            Policy::new("p1", "One", json!({"bitLockerEnabled": true, "passwordMinimumLength": 8})),
            Policy::from_raw("p2", "Broken", "{not json"),
            Policy::new("p4", "Array payload", json!([1, 2, 3])),
        ]
    }

    #[test]
    fn test_run_isolates_failures_and_sorts() {
        let runner = BatchRunner::new(
            catalog(),
            StrategySet::standard(),
            RunnerConfig::new().with_max_workers(3),
        );
        let report = runner.run_all_at(&policies(), at()).unwrap();
        let outcome = &report.outcome;

        assert_eq!(outcome.summary.policies_processed, 3);
        assert_eq!(outcome.summary.policies_failed, 1);
        assert_eq!(outcome.failures[0].policy_id, "p2");

        let ids: Vec<_> = outcome
            .checks
            .iter()
            .map(|c| (c.policy_id.as_str(), c.requirement_id.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("p1", "REQ-BL"),
                ("p1", "REQ-PIN"),
                ("p3", "REQ-BL"),
                ("p3", "REQ-PIN"),
                ("p4", "REQ-BL"),
                ("p4", "REQ-PIN"),
            ]
        );
        assert!(outcome.checks.iter().all(|c| c.last_checked == at()));
        assert_eq!(
            outcome.check("p4", "REQ-BL").unwrap().status,
            CheckStatus::NotExtracted
        );
        assert_eq!(
            outcome.check("p3", "REQ-BL").unwrap().status,
            CheckStatus::NonCompliant
        );
        assert_eq!(outcome.control("SC-28").unwrap().coverage, CoverageStatus::FullyCovered);
        assert_eq!(outcome.control("IA-5").unwrap().coverage, CoverageStatus::FullyCovered);
        assert!(outcome.gaps.is_empty());
        assert_eq!(outcome.summary.coverage_percentage, 100.0);
    }

    #[test]
    fn test_failing_policy_produces_pair_gap() {
        let only_failing = vec![Policy::new("p3", "Three", json!({"bitLockerEnabled": false}))];
        let report = BatchRunner::with_defaults(catalog())
            .run_all_at(&only_failing, at())
            .unwrap();
        let gaps = &report.outcome.gaps;
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].control_id, "IA-5");
        assert_eq!(gaps[0].gap_type, GapType::NoSettings);
        assert_eq!(gaps[1].control_id, "SC-28");
        assert_eq!(gaps[1].gap_type, GapType::NonCompliantSettings);
        assert_eq!(gaps[1].policy_id.as_deref(), Some("p3"));
    }

    #[test]
    fn test_outcome_independent_of_worker_count() {
        let serial = BatchRunner::new(
            catalog(),
            StrategySet::standard(),
            RunnerConfig::new().with_max_workers(1),
        );
        let parallel = BatchRunner::new(
            catalog(),
            StrategySet::standard(),
            RunnerConfig::new().with_max_workers(8),
        );
        let mut reversed = policies();
        reversed.reverse();

        let a = serial.run_all_at(&policies(), at()).unwrap();
        let b = parallel.run_all_at(&reversed, at()).unwrap();
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.outcome_json().unwrap(), b.outcome_json().unwrap());
    }

    #[test]
    fn test_unusable_catalog_is_refused() {
        let runner = BatchRunner::with_defaults(Arc::new(Catalog::default()));
        assert_matches!(
            runner.run_all(&policies()),
            Err(RunnerError::CatalogUnusable(CatalogError::Unusable { .. }))
        );
    }

    #[test]
    fn test_empty_policy_list() {
        let report = BatchRunner::with_defaults(catalog())
            .run_all_at(&[], at())
            .unwrap();
        assert_eq!(report.outcome.summary.policies_processed, 0);
        assert_eq!(report.outcome.summary.not_covered, 2);
        assert_eq!(report.outcome.gaps.len(), 2);
    }

    struct PanickingStrategy;

    impl ExtractionStrategy for PanickingStrategy {
        fn kind(&self) -> StrategyKind {
            StrategyKind::DirectPath
        }

        fn confidence(&self) -> f64 {
            1.0
        }

        fn attempt(
            &self,
            ctx: &ExtractionContext<'_>,
            _target: &SettingTarget<'_>,
        ) -> Option<ExtractionMatch> {
            if ctx.policy.id == "p3" {
                panic!("strategy exploded");
            }
            Some(ExtractionMatch {
                value: SettingValue::Boolean(true),
                path: "x".into(),
                strategy: StrategyKind::DirectPath,
                confidence: 1.0,
                rationale: "fixed".into(),
            })
        }
    }

    #[test]
    fn test_panic_is_isolated_to_one_policy() {
        let strategies = StrategySet::builder().with_strategy(PanickingStrategy).build();
        let runner =
            BatchRunner::new(catalog(), strategies, RunnerConfig::new().with_max_workers(2));
        let report = runner.run_all_at(&policies(), at()).unwrap();

        let failed: Vec<_> = report
            .outcome
            .failures
            .iter()
            .map(|f| f.policy_id.as_str())
            .collect();
        assert_eq!(failed, vec!["p2", "p3"]);
        assert!(report.outcome.failures[1].reason.contains("strategy exploded"));
        assert_eq!(report.outcome.summary.policies_processed, 2);
    }

    #[test]
    fn test_run_source() {
        let source = InMemoryPolicySource::new(policies());
        let report = BatchRunner::with_defaults(catalog())
            .run_source(&source)
            .unwrap();
        assert_eq!(report.outcome.summary.policies_failed, 1);
    }

    #[test]
    fn test_rejected_records_count_as_failures() {
        let batch = PolicyBatch {
            policies: vec![Policy::new(
                "good",
                "Good",
                json!({"bitLockerEnabled": true, "passwordMinimumLength": 8}),
            )],
            rejected: vec![PolicyFailure {
                policy_id: "bad".into(),
                policy_name: "Bad".into(),
                reason: "export.json: record 1: unknown platform 'symbian'".into(),
            }],
        };
        let report = BatchRunner::with_defaults(catalog())
            .run_batch_at(&batch, at())
            .unwrap();
        let outcome = &report.outcome;

        assert_eq!(outcome.summary.policies_processed, 1);
        assert_eq!(outcome.summary.policies_failed, 1);
        assert_eq!(outcome.failures[0].policy_id, "bad");
        assert_eq!(
            outcome.check("good", "REQ-BL").unwrap().status,
            CheckStatus::Compliant
        );
        assert!(outcome.has_failures());
    }

    #[test]
    fn test_run_source_counts_rejected_files() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("policies.json"),
            r#"[{"id": "ok", "name": "OK", "payload": {"bitLockerEnabled": true}},
                {"id": "bad", "platform": "symbian", "payload": {}}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("truncated.json"), "[{").unwrap();

        let source = DirectoryPolicySource::new(dir.path());
        let report = BatchRunner::with_defaults(catalog())
            .run_source(&source)
            .unwrap();

        assert_eq!(report.outcome.summary.policies_processed, 1);
        assert_eq!(report.outcome.summary.policies_failed, 2);
        assert!(report.outcome.check("ok", "REQ-BL").is_some());
    }

    #[test]
    fn test_duplicate_policy_ids_are_rejected() {
        let policies = vec![
            Policy::new("dup", "First", json!({"bitLockerEnabled": true})),
            Policy::new("solo", "Solo", json!({"bitLockerEnabled": true})),
            Policy::new("dup", "Second", json!({"bitLockerEnabled": false})),
        ];
        let runner = BatchRunner::with_defaults(catalog());
        let report = runner.run_all_at(&policies, at()).unwrap();
        let outcome = &report.outcome;

        assert_eq!(outcome.summary.policies_processed, 1);
        assert_eq!(outcome.summary.policies_failed, 2);
        assert!(outcome.checks.iter().all(|c| c.policy_id == "solo"));
        assert_eq!(outcome.policy_summaries.len(), 1);
        let names: Vec<_> = outcome.failures.iter().map(|f| f.policy_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert!(outcome.failures[0].reason.contains("appears 2 times"));

        let mut reversed = policies.clone();
        reversed.reverse();
        assert_eq!(runner.run_all_at(&reversed, at()).unwrap().outcome, report.outcome);
    }

    fn bitlocker_catalog() -> Arc<Catalog> {
        Arc::new(Catalog::from_requirements(vec![
            Requirement::new(
                "REQ-A",
                "BitLocker enabled",
                PathExpr::key("bitLockerEnabled"),
                Operator::Boolean,
                ExpectedValue::Boolean(true),
            )
            .with_controls(&["SC-28"]),
            Requirement::new(
                "REQ-B",
                "Encryption method",
                PathExpr::key("encryptionMethod"),
                Operator::Equals,
                ExpectedValue::List(vec!["AES256".into(), "XTS-AES256".into()]),
            )
            .with_controls(&["SC-28"]),
        ]))
    }

    fn bitlocker_policy() -> Policy {
        Policy::new(
            "bitlocker",
            "BitLocker Baseline",
            json!({"bitLockerEnabled": true, "encryptionMethod": "XTS-AES256"}),
        )
    }

    #[test]
    fn test_bitlocker_end_to_end() {
        let report = BatchRunner::with_defaults(bitlocker_catalog())
            .run_all_at(&[bitlocker_policy()], at())
            .unwrap();
        let outcome = &report.outcome;

        assert!(outcome.checks.iter().all(|c| c.is_compliant));
        let summary = &outcome.policy_summaries[0];
        assert_eq!(
            (
                summary.total_checks,
                summary.extracted_count,
                summary.compliant_count,
                summary.non_compliant_count
            ),
            (2, 2, 2, 0)
        );
        assert_eq!(outcome.control("SC-28").unwrap().coverage, CoverageStatus::FullyCovered);
    }

    #[test]
    fn test_bitlocker_miss_is_absent() {
        let catalog = Arc::new(Catalog::from_requirements(vec![Requirement::new(
            "REQ-C",
            "Removable drive encryption",
            PathExpr::key("removableDriveEncryptionMethod"),
            Operator::Equals,
            ExpectedValue::Text("AES256".into()),
        )]));
        let report = BatchRunner::with_defaults(catalog)
            .run_all_at(&[bitlocker_policy()], at())
            .unwrap();

        let check = report.outcome.check("bitlocker", "REQ-C").unwrap();
        assert_eq!(check.status, CheckStatus::NotExtracted);
        assert_eq!(check.actual_value, None);
        assert!(!check.is_compliant);
        let summary = &report.outcome.policy_summaries[0];
        assert_eq!((summary.total_checks, summary.extracted_count), (1, 0));
    }

    #[test]
    fn test_selector_requirement_ignores_unrelated_catalog_settings() {
        let catalog = Arc::new(Catalog::from_requirements(vec![Requirement::new(
            "REQ-METHOD",
            "BitLocker encryption method",
            PathExpr::parse(
                "settings[definitionId=device_vendor_msft_bitlocker_encryptionmethod].value",
            )
            .unwrap(),
            Operator::Equals,
            ExpectedValue::Text("xtsAes256".into()),
        )]));
        let policy = Policy::new(
            "defender",
            "Defender baseline",
            json!({"settings": [
                {"definitionId": "device_vendor_msft_defender_cpuloadfactor_value", "value": "50"}
            ]}),
        );
        let report = BatchRunner::with_defaults(catalog)
            .run_all_at(&[policy], at())
            .unwrap();

        let check = report.outcome.check("defender", "REQ-METHOD").unwrap();
        assert_eq!(check.status, CheckStatus::NotExtracted);
        assert_eq!(check.actual_value, None);
        assert_eq!(
            check.setting_name,
            "device_vendor_msft_bitlocker_encryptionmethod"
        );
    }

    #[test]
    fn test_absent_paths_never_produce_values() {
        let catalog = Arc::new(Catalog::from_requirements(vec![
            Requirement::new(
                "REQ-METHOD",
                "Fixed drive encryption method",
                PathExpr::parse("fixedDrivePolicy.encryptionMethod").unwrap(),
                Operator::Equals,
                ExpectedValue::Text("xtsAes256".into()),
            ),
            Requirement::new(
                "REQ-REMOVABLE",
                "Removable drive encryption",
                PathExpr::key("removableDriveEncryptionMethod"),
                Operator::Equals,
                ExpectedValue::Text("AES256".into()),
            ),
        ]));
        let policies = vec![
            bitlocker_policy(),
            Policy::new(
                "intent",
                "Disk encryption intent",
                json!({"settings": [
                    {"definitionId": "bitlocker_encryptionEnabled", "value": true}
                ]}),
            ),
            Policy::new("empty", "Empty", json!({})),
        ];
        let report = BatchRunner::with_defaults(catalog)
            .run_all_at(&policies, at())
            .unwrap();
        assert_eq!(report.outcome.checks.len(), 6);
        assert!(report
            .outcome
            .checks
            .iter()
            .all(|c| c.actual_value.is_none() && c.status == CheckStatus::NotExtracted));
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let runner = BatchRunner::with_defaults(bitlocker_catalog());
        let mut inputs = policies();
        inputs.push(bitlocker_policy());
        let first = runner.run_all_at(&inputs, at()).unwrap();
        let second = runner.run_all_at(&inputs, at()).unwrap();
        assert_eq!(first.outcome, second.outcome);
        assert_ne!(first.metadata.run_id, second.metadata.run_id);
        for summary in &first.outcome.policy_summaries {
            assert_eq!(
                summary.extracted_count,
                summary.compliant_count + summary.non_compliant_count
            );
            assert!(summary.extracted_count <= summary.total_checks);
        }
    }
}
