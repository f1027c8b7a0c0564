//! # Run Report
//!
//! The report separates run metadata (id, host, wall-clock timing) from the
//! outcome, which depends only on the policies, the catalog and the
//! evaluation timestamp.

use super::aggregator::Aggregation;
use super::types::{
    ComplianceCheck, ControlGap, ControlSummary, PolicyFailure, PolicySummary, RunSummary,
};
use chrono::{DateTime, Utc};
use psc_catalog::catalog::CatalogIssue;
use serde::{Deserialize, Serialize};

/// Where the run executed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    pub hostname: String,
    pub os_info: String,
}

impl HostContext {
    pub fn from_system() -> Self {
        Self {
            hostname: hostname::get()
                .unwrap_or_else(|_| std::ffi::OsString::from("unknown"))
                .to_string_lossy()
                .to_string(),
            os_info: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    pub fn new(hostname: impl Into<String>, os_info: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            os_info: os_info.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub engine_version: String,
    pub catalog_version: String,
    pub host: HostContext,
    /// Timestamp stamped on every check
    pub evaluated_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub workers: usize,
}

impl RunMetadata {
    pub fn new(catalog_version: &str, evaluated_at: DateTime<Utc>, workers: usize) -> Self {
        let now = Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            catalog_version: catalog_version.to_string(),
            host: HostContext::from_system(),
            evaluated_at,
            started_at: now,
            completed_at: now,
            duration_ms: 0,
            workers,
        }
    }

    pub fn complete(&mut self) {
        self.completed_at = Utc::now();
        self.duration_ms = (self.completed_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64;
    }
}

/// Deterministic part of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub policy_summaries: Vec<PolicySummary>,
    pub control_summaries: Vec<ControlSummary>,
    pub gaps: Vec<ControlGap>,
    pub checks: Vec<ComplianceCheck>,
    pub failures: Vec<PolicyFailure>,
    pub configuration_issues: Vec<CatalogIssue>,
}

impl RunOutcome {
    pub fn new(
        aggregation: Aggregation,
        checks: Vec<ComplianceCheck>,
        failures: Vec<PolicyFailure>,
        configuration_issues: Vec<CatalogIssue>,
    ) -> Self {
        Self {
            summary: aggregation.summary,
            policy_summaries: aggregation.policy_summaries,
            control_summaries: aggregation.control_summaries,
            gaps: aggregation.gaps,
            checks,
            failures,
            configuration_issues,
        }
    }

    /// Checks for one policy, in requirement order
    pub fn checks_for_policy<'a>(
        &'a self,
        policy_id: &'a str,
    ) -> impl Iterator<Item = &'a ComplianceCheck> + 'a {
        self.checks.iter().filter(move |c| c.policy_id == policy_id)
    }

    pub fn check(&self, policy_id: &str, requirement_id: &str) -> Option<&ComplianceCheck> {
        self.checks
            .iter()
            .find(|c| c.policy_id == policy_id && c.requirement_id == requirement_id)
    }

    pub fn control(&self, control_id: &str) -> Option<&ControlSummary> {
        self.control_summaries
            .iter()
            .find(|c| c.control_id == control_id)
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Outcome only, for comparing runs
    pub fn outcome_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.outcome)
    }

    pub fn summary(&self) -> String {
        let s = &self.outcome.summary;
        format!(
            "Compliance Run Summary:\n\
         Run ID: {}\n\
         Policies Processed: {}\n\
         Policies Failed: {}\n\
         Checks: {} (extracted {}, compliant {}, non-compliant {})\n\
         Configuration Errors: {}\n\
         Extraction Rate: {:.1}%\n\
         Controls: {} (fully covered {}, partial {}, non-compliant {}, not covered {}, \
         indeterminate {})\n\
         Control Coverage: {:.1}%\n\
         Gaps: {}\n\
         Duration: {} ms",
            self.metadata.run_id,
            s.policies_processed,
            s.policies_failed,
            s.total_checks,
            s.extracted_checks,
            s.compliant_checks,
            s.non_compliant_checks,
            s.configuration_errors,
            s.extraction_rate,
            s.total_controls,
            s.fully_covered,
            s.partially_covered,
            s.non_compliant_controls,
            s.not_covered,
            s.indeterminate_controls,
            s.coverage_percentage,
            s.gap_count,
            self.metadata.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_completion() {
        let mut metadata = RunMetadata::new("1.0", Utc::now(), 4);
        metadata.complete();
        assert!(metadata.completed_at >= metadata.started_at);
        assert!(!metadata.host.hostname.is_empty());
        assert_eq!(metadata.catalog_version, "1.0");
    }

    #[test]
    fn test_report_serializes_both_blocks() {
        let report = RunReport {
            metadata: RunMetadata::new("1.0", Utc::now(), 1),
            outcome: RunOutcome::default(),
        };
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value["metadata"]["run_id"].is_string());
        assert_eq!(value["outcome"]["summary"]["total_checks"], 0);
        assert!(report.summary().contains("Control Coverage: 0.0%"));
    }
}
