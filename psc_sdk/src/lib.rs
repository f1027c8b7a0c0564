//! # PSC SDK
//!
//! Ready-to-run compliance engine for Microsoft Intune policy exports.
//! Supplies built-in template family profiles and constructors that wire a
//! compiled catalog, the standard strategy set and the runtime configuration
//! into a [`BatchRunner`].

pub mod families;

use psc_catalog::logging::codes;
use psc_catalog::{log_error, log_info, log_warning};
use psc_catalog::{Catalog, CatalogCompilation, CatalogIssue, EngineConfig};
use psc_engine::sources::{CachedPolicySource, DirectoryPolicySource};
use psc_engine::{BatchRunner, RunnerConfig, RunnerError, StrategySet};
use std::path::Path;
use std::sync::Arc;

pub use families::builtin_families;

/// Strategy set used by every engine the SDK builds
///
/// Order:
/// - Direct path (exact setting path and alternates)
/// - Template path (family prefixes and aliases)
/// - Array scan (settings catalog `settings[]` records)
/// - Alternate name (historical synonyms)
pub fn create_strategy_set() -> StrategySet {
    StrategySet::standard()
}

/// Merge built-in families and configuration overrides into a compiled catalog
pub fn prepare_catalog(catalog: Catalog, config: &EngineConfig) -> Catalog {
    let min_name_length = config.effective_min_name_length(catalog.matching().min_name_length);
    catalog
        .merge_families(builtin_families())
        .with_min_name_length(min_name_length)
}

/// Build a runner for a compiled catalog
///
/// Catalog issues travel with the runner into every report. A catalog that
/// cannot produce a single verdict is refused here rather than at run time.
pub fn create_engine(
    compilation: CatalogCompilation,
    config: &EngineConfig,
) -> Result<BatchRunner, RunnerError> {
    let CatalogCompilation { catalog, issues } = compilation;
    for issue in &issues {
        log_warning!(code = issue.kind.log_code(), "Catalog issue",
            "requirement_id" => issue.requirement_id.as_deref().unwrap_or("-"),
            "reason" => issue.message
        );
    }

    let catalog = prepare_catalog(catalog, config);
    catalog.ensure_usable().map_err(|e| {
        log_error!(codes::catalog::CATALOG_UNUSABLE, "Catalog cannot be used",
            "reason" => e
        );
        RunnerError::CatalogUnusable(e)
    })?;

    log_info!("Engine ready",
        "catalog_version" => catalog.version(),
        "requirements" => catalog.requirements().len(),
        "controls" => catalog.controls().len(),
        "families" => catalog.families().len(),
        "issues" => issues.len()
    );

    Ok(BatchRunner::new(
        Arc::new(catalog),
        create_strategy_set(),
        RunnerConfig::from_engine_config(config),
    )
    .with_configuration_issues(issues))
}

/// Load a catalog file and build a runner for it
pub fn load_engine(catalog_path: &Path, config: &EngineConfig) -> Result<BatchRunner, RunnerError> {
    let compilation = Catalog::load(catalog_path).map_err(|e| {
        log_error!(e.log_code(), "Failed to load catalog",
            "path" => catalog_path.display(),
            "reason" => e
        );
        RunnerError::CatalogUnusable(e)
    })?;
    create_engine(compilation, config)
}

/// Directory source behind the configured cache TTL
pub fn create_policy_source(
    root: &Path,
    config: &EngineConfig,
) -> CachedPolicySource<DirectoryPolicySource> {
    CachedPolicySource::with_ttl_seconds(
        DirectoryPolicySource::new(root),
        config.source.cache_ttl_seconds,
    )
}

/// Issues that dropped a requirement from the catalog
pub fn rejected_issues(issues: &[CatalogIssue]) -> impl Iterator<Item = &CatalogIssue> {
    issues.iter().filter(|i| !i.kind.keeps_requirement())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use psc_engine::strategies::StrategyKind;
    use psc_engine::{CheckStatus, Policy};
    use serde_json::json;

    const CATALOG: &str = r#"{
        "version": "2024.1",
        "requirements": [
            {"id": "REQ-BL-ON", "name": "BitLocker enabled", "control_ids": ["SC-28"],
             "template_family": "windows10EndpointProtection",
             "setting_path": "bitLockerEnabled", "operator": "boolean", "expected_value": true},
            {"id": "REQ-BL-OS", "name": "OS drive encryption method", "control_ids": ["SC-28"],
             "template_family": "windows10EndpointProtection",
             "setting_path": "encryptionMethod", "operator": "equals",
             "expected_value": ["xtsAes128", "xtsAes256"]},
            {"id": "REQ-IOS-PIN", "name": "Passcode length", "control_ids": ["IA-5"],
             "template_family": "iosGeneral",
             "setting_path": "passwordMinimumLength", "operator": "numeric_range",
             "expected_value": {"min": 6}},
            {"id": "REQ-BAD", "name": "Broken", "setting_path": "a[", "operator": "equals",
             "expected_value": "x"}
        ]
    }"#;

    fn config() -> EngineConfig {
        EngineConfig::from_toml_str("[runner]\nmax_workers = 2\n").unwrap()
    }

    #[test]
    fn test_strategy_set_creation() {
        let stats = create_strategy_set().get_statistics();
        assert_eq!(stats.total_strategies, 4);
        assert_eq!(
            stats.order,
            vec![
                StrategyKind::DirectPath,
                StrategyKind::TemplatePath,
                StrategyKind::ArrayScan,
                StrategyKind::AlternateName,
            ]
        );
        assert!(stats.confidences.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_engine_merges_builtin_families() {
        let runner = create_engine(Catalog::from_json_str(CATALOG).unwrap(), &config()).unwrap();
        assert_eq!(runner.catalog().families().len(), builtin_families().len());
        assert_eq!(runner.config().max_workers, 2);
        assert_eq!(runner.catalog().requirements().len(), 3);
    }

    #[test]
    fn test_catalog_family_takes_precedence() {
        let catalog = Catalog::from_json_str(CATALOG)
            .unwrap()
            .catalog
            .with_family(psc_catalog::TemplateFamilyProfile::new("iosGeneral"));
        let prepared = prepare_catalog(catalog, &config());
        let ios = prepared.family("iosGeneral").unwrap();
        assert!(ios.aliases.is_empty());
        assert!(ios.odata_types.is_empty());
    }

    #[test]
    fn test_min_name_length_override() {
        let config =
            EngineConfig::from_toml_str("[extraction]\nmin_name_match_length = 9\n").unwrap();
        let prepared = prepare_catalog(Catalog::from_json_str(CATALOG).unwrap().catalog, &config);
        assert_eq!(prepared.matching().min_name_length, 9);
    }

    #[test]
    fn test_unusable_catalog_refused() {
        let compilation = Catalog::from_json_str(r#"{"requirements": []}"#).unwrap();
        assert_matches!(
            create_engine(compilation, &config()),
            Err(RunnerError::CatalogUnusable(_))
        );
        assert_matches!(
            load_engine(Path::new("/no/such/catalog.json"), &config()),
            Err(RunnerError::CatalogUnusable(_))
        );
    }

    #[test]
    fn test_graph_exports_through_builtin_families() {
        let compilation = Catalog::from_json_str(CATALOG).unwrap();
        assert_eq!(rejected_issues(&compilation.issues).count(), 1);
        let runner = create_engine(compilation, &config()).unwrap();

        let policies = vec![
            Policy::new(
                "win-ep",
                "Windows BitLocker",
                json!({
                    "@odata.type": "#microsoft.graph.windows10EndpointProtectionConfiguration",
                    "bitLockerEncryptDevice": true,
                    "bitLockerSystemDrivePolicy": {"encryptionMethod": "xtsAes256"}
                }),
            ),
            Policy::new(
                "ios-gen",
                "iOS Passcode",
                json!({
                    "@odata.type": "#microsoft.graph.iosGeneralDeviceConfiguration",
                    "passcodeMinimumLength": 4
                }),
            ),
        ];
        let report = runner.run_all(&policies).unwrap();
        let outcome = &report.outcome;

        let on = outcome.check("win-ep", "REQ-BL-ON").unwrap();
        assert_eq!(on.status, CheckStatus::Compliant);
        assert_eq!(on.matched_path.as_deref(), Some("bitLockerEncryptDevice"));

        let os = outcome.check("win-ep", "REQ-BL-OS").unwrap();
        assert_eq!(os.status, CheckStatus::Compliant);
        assert_eq!(
            os.matched_path.as_deref(),
            Some("bitLockerSystemDrivePolicy.encryptionMethod")
        );

        let pin = outcome.check("ios-gen", "REQ-IOS-PIN").unwrap();
        assert_eq!(pin.status, CheckStatus::NonCompliant);

        assert!(outcome.check("ios-gen", "REQ-BL-ON").is_none());
        assert_eq!(outcome.summary.total_checks, 3);
        assert_eq!(outcome.configuration_issues.len(), 1);
    }

    #[test]
    fn test_policy_source_uses_configured_ttl() {
        let config = EngineConfig::from_toml_str("[source]\ncache_ttl_seconds = 42\n").unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let source = create_policy_source(dir.path(), &config);
        assert_eq!(source.ttl(), chrono::Duration::seconds(42));
        assert_eq!(source.inner().root(), dir.path());
    }
}
