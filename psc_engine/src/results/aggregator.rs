//! # Aggregator
//!
//! Single-threaded reduction of all compliance checks into per-policy
//! summaries, per-control coverage, gaps and the run summary. Every output
//! list is sorted so the result depends only on the inputs.

use super::types::{
    percentage, CheckStatus, ComplianceCheck, ControlGap, ControlSummary, CoverageStatus,
    GapType, PolicySummary, RequirementCoverage, RequirementState, RunSummary,
};
use crate::types::Policy;
use psc_catalog::catalog::{Catalog, Control};
use psc_catalog::logging::codes;
use psc_catalog::log_success;
use std::collections::{BTreeMap, BTreeSet};

/// Everything derived from the checks of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub summary: RunSummary,
    pub policy_summaries: Vec<PolicySummary>,
    pub control_summaries: Vec<ControlSummary>,
    pub gaps: Vec<ControlGap>,
}

pub struct ComplianceAggregator<'a> {
    catalog: &'a Catalog,
}

impl<'a> ComplianceAggregator<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Reduce the checks of `policies`; `policies_failed` only feeds the summary
    ///
    /// Policy ids must be distinct. The runner rejects duplicates before
    /// evaluation.
    pub fn aggregate(
        &self,
        policies: &[Policy],
        checks: &[ComplianceCheck],
        policies_failed: usize,
    ) -> Aggregation {
        let policy_summaries = self.summarize_policies(policies, checks);

        let mut by_requirement: BTreeMap<&str, Vec<&ComplianceCheck>> = BTreeMap::new();
        for check in checks {
            by_requirement
                .entry(check.requirement_id.as_str())
                .or_default()
                .push(check);
        }

        let mut control_summaries = Vec::with_capacity(self.catalog.controls().len());
        let mut gaps = Vec::new();
        for control in self.catalog.controls().iter() {
            let summary = self.summarize_control(control, &by_requirement);
            gaps.extend(self.gaps_for(control, &summary, &by_requirement));
            control_summaries.push(summary);
        }
        gaps.sort_by(|a, b| {
            (&a.control_id, a.gap_type, &a.policy_id, &a.requirement_id).cmp(&(
                &b.control_id,
                b.gap_type,
                &b.policy_id,
                &b.requirement_id,
            ))
        });

        let summary = build_summary(
            policies.len(),
            policies_failed,
            checks,
            &control_summaries,
            gaps.len(),
        );

        log_success!(codes::success::AGGREGATION_COMPLETE, "Aggregation complete",
            "checks" => checks.len(),
            "controls" => summary.total_controls,
            "gaps" => summary.gap_count,
            "coverage_percent" => format!("{:.1}", summary.coverage_percentage)
        );

        Aggregation {
            summary,
            policy_summaries,
            control_summaries,
            gaps,
        }
    }

    fn summarize_policies(
        &self,
        policies: &[Policy],
        checks: &[ComplianceCheck],
    ) -> Vec<PolicySummary> {
        let mut summaries: BTreeMap<&str, PolicySummary> = policies
            .iter()
            .map(|p| (p.id.as_str(), PolicySummary::new(p)))
            .collect();
        for check in checks {
            if let Some(summary) = summaries.get_mut(check.policy_id.as_str()) {
                summary.record(check.status);
            }
        }
        summaries.into_values().collect()
    }

    fn summarize_control(
        &self,
        control: &Control,
        by_requirement: &BTreeMap<&str, Vec<&ComplianceCheck>>,
    ) -> ControlSummary {
        let requirements: Vec<RequirementCoverage> = control
            .requirement_ids
            .iter()
            .map(|id| {
                let checks = by_requirement.get(id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                let count =
                    |status: CheckStatus| checks.iter().filter(|c| c.status == status).count();
                let compliant_checks = count(CheckStatus::Compliant);
                let non_compliant_checks = count(CheckStatus::NonCompliant);
                let configuration_errors = count(CheckStatus::ConfigurationError);
                let rejected_shape = self
                    .catalog
                    .requirement(id)
                    .is_some_and(|r| !r.is_evaluable());
                let state = if rejected_shape
                    || (!checks.is_empty() && configuration_errors == checks.len())
                {
                    RequirementState::Misconfigured
                } else if compliant_checks > 0 {
                    RequirementState::Satisfied
                } else if non_compliant_checks > 0 {
                    RequirementState::Failing
                } else {
                    RequirementState::Missing
                };
                RequirementCoverage {
                    requirement_id: id.clone(),
                    state,
                    compliant_checks,
                    non_compliant_checks,
                    not_extracted_checks: count(CheckStatus::NotExtracted),
                    configuration_errors,
                }
            })
            .collect();

        let tally =
            |state: RequirementState| requirements.iter().filter(|r| r.state == state).count();
        let satisfied = tally(RequirementState::Satisfied);
        let failing = tally(RequirementState::Failing);
        let missing = tally(RequirementState::Missing);
        let misconfigured = tally(RequirementState::Misconfigured);
        let evaluable = requirements.len() - misconfigured;

        ControlSummary {
            control_id: control.id.clone(),
            title: control.title.clone(),
            family: control.family.clone(),
            coverage: classify_coverage(evaluable, satisfied, failing, misconfigured),
            requirement_count: evaluable,
            satisfied_requirements: satisfied,
            failing_requirements: failing,
            missing_requirements: missing,
            misconfigured_requirements: misconfigured,
            requirements,
        }
    }

    fn gaps_for(
        &self,
        control: &Control,
        summary: &ControlSummary,
        by_requirement: &BTreeMap<&str, Vec<&ComplianceCheck>>,
    ) -> Vec<ControlGap> {
        match summary.coverage {
            CoverageStatus::FullyCovered | CoverageStatus::Indeterminate => Vec::new(),
            CoverageStatus::NotCovered => {
                let settings: Vec<&str> = summary
                    .requirements
                    .iter()
                    .filter(|r| r.state != RequirementState::Misconfigured)
                    .filter_map(|r| self.catalog.requirement(&r.requirement_id))
                    .map(|r| r.setting_name())
                    .collect();
                let action = if settings.is_empty() {
                    format!("Map at least one requirement to control {}", control.id)
                } else {
                    format!(
                        "Deploy a policy configuring {} for control {}",
                        settings.join(", "),
                        control.id
                    )
                };
                vec![ControlGap::new(control.id.clone(), GapType::NoSettings)
                    .with_control_title(control.title.clone())
                    .with_action(action)]
            }
            CoverageStatus::PartiallyCovered | CoverageStatus::NonCompliant => {
                let mut gaps = Vec::new();
                for coverage in &summary.requirements {
                    let Some(requirement) = self.catalog.requirement(&coverage.requirement_id)
                    else {
                        continue;
                    };
                    match coverage.state {
                        RequirementState::Satisfied | RequirementState::Misconfigured => {}
                        RequirementState::Failing => {
                            let mut seen = BTreeSet::new();
                            let failing = by_requirement
                                .get(requirement.id.as_str())
                                .into_iter()
                                .flatten()
                                .filter(|c| c.status == CheckStatus::NonCompliant);
                            for check in failing {
                                if !seen.insert(check.policy_id.as_str()) {
                                    continue;
                                }
                                gaps.push(
                                    ControlGap::new(
                                        control.id.clone(),
                                        GapType::NonCompliantSettings,
                                    )
                                    .with_control_title(control.title.clone())
                                    .with_policy(&check.policy_id, &check.policy_name)
                                    .with_requirement(requirement)
                                    .with_actual_value(check.actual_value.clone())
                                    .with_action(format!(
                                        "Update policy '{}': {}",
                                        check.policy_name,
                                        requirement.remediation_text()
                                    )),
                                );
                            }
                        }
                        RequirementState::Missing => gaps.push(
                            ControlGap::new(control.id.clone(), GapType::NoSettings)
                                .with_control_title(control.title.clone())
                                .with_requirement(requirement)
                                .with_action(requirement.remediation_text()),
                        ),
                    }
                }
                gaps
            }
        }
    }
}

/// Coverage from evaluable requirement-state counts
pub fn classify_coverage(
    total: usize,
    satisfied: usize,
    failing: usize,
    misconfigured: usize,
) -> CoverageStatus {
    if total == 0 && misconfigured > 0 {
        CoverageStatus::Indeterminate
    } else if total > 0 && satisfied == total {
        CoverageStatus::FullyCovered
    } else if satisfied > 0 {
        CoverageStatus::PartiallyCovered
    } else if failing > 0 {
        CoverageStatus::NonCompliant
    } else {
        CoverageStatus::NotCovered
    }
}

fn build_summary(
    policies_processed: usize,
    policies_failed: usize,
    checks: &[ComplianceCheck],
    controls: &[ControlSummary],
    gap_count: usize,
) -> RunSummary {
    let count = |status: CheckStatus| checks.iter().filter(|c| c.status == status).count();
    let compliant_checks = count(CheckStatus::Compliant);
    let non_compliant_checks = count(CheckStatus::NonCompliant);
    let not_extracted_checks = count(CheckStatus::NotExtracted);
    let configuration_errors = count(CheckStatus::ConfigurationError);
    let extracted_checks = compliant_checks + non_compliant_checks;
    let total_checks = extracted_checks + not_extracted_checks;

    let coverage =
        |status: CoverageStatus| controls.iter().filter(|c| c.coverage == status).count();
    let fully_covered = coverage(CoverageStatus::FullyCovered);
    let indeterminate_controls = coverage(CoverageStatus::Indeterminate);

    RunSummary {
        policies_processed,
        policies_failed,
        total_checks,
        extracted_checks,
        compliant_checks,
        non_compliant_checks,
        not_extracted_checks,
        configuration_errors,
        extraction_rate: percentage(extracted_checks, total_checks),
        total_controls: controls.len(),
        fully_covered,
        partially_covered: coverage(CoverageStatus::PartiallyCovered),
        non_compliant_controls: coverage(CoverageStatus::NonCompliant),
        not_covered: coverage(CoverageStatus::NotCovered),
        indeterminate_controls,
        coverage_percentage: percentage(fully_covered, controls.len() - indeterminate_controls),
        gap_count,
    }
}
