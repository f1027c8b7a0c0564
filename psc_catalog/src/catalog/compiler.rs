//! Catalog compilation: authored document to executable catalog
//!
//! A bad entry never fails the whole catalog. Requirements whose path,
//! operator, expected value or platform cannot be read are rejected with a
//! [`CatalogIssue`]; requirements whose operator cannot evaluate their
//! expected value are kept (they surface as configuration-error checks) and
//! also reported. Only I/O, parse failures and an over-sized catalog are fatal.

use super::controls::{ControlRegistry, ControlSpec};
use super::document::CatalogDocument;
use super::error::{CatalogError, CatalogIssue, IssueKind};
use super::expected::ExpectedValue;
use super::families::{ArrayScanConfig, TemplateFamilyProfile};
use super::operator::Operator;
use super::requirement::{Platform, Requirement, RequirementSpec};
use crate::config::compile_time::catalog::{DEFAULT_CATALOG_VERSION, MAX_REQUIREMENTS};
use crate::logging::codes;
use crate::path::PathExpr;
use crate::{log_debug, log_success, log_warning};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Executable requirement catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    version: String,
    requirements: Vec<Requirement>,
    index: BTreeMap<String, usize>,
    controls: ControlRegistry,
    families: Vec<TemplateFamilyProfile>,
    matching: ArrayScanConfig,
}

/// Result of compiling a catalog document
#[derive(Debug, Clone)]
pub struct CatalogCompilation {
    pub catalog: Catalog,
    pub issues: Vec<CatalogIssue>,
}

impl CatalogCompilation {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issues that caused a requirement to be dropped
    pub fn rejected(&self) -> impl Iterator<Item = &CatalogIssue> {
        self.issues.iter().filter(|i| !i.kind.keeps_requirement())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            version: DEFAULT_CATALOG_VERSION.to_string(),
            requirements: Vec::new(),
            index: BTreeMap::new(),
            controls: ControlRegistry::new(),
            families: Vec::new(),
            matching: ArrayScanConfig::default(),
        }
    }
}

impl Catalog {
    /// Build a catalog from already compiled requirements
    ///
    /// Controls are derived from each requirement's `control_ids`. Later
    /// requirements with a repeated id are ignored.
    pub fn from_requirements(requirements: Vec<Requirement>) -> Self {
        let mut catalog = Catalog::default();
        let mut seen = BTreeSet::new();
        for requirement in requirements {
            if seen.insert(requirement.id.clone()) {
                catalog.requirements.push(requirement);
            }
        }
        catalog.rebuild();
        catalog
    }

    /// Declare an explicit control (merged with requirement links)
    pub fn with_control(mut self, spec: ControlSpec) -> Self {
        self.controls.declare(&spec);
        self.rebuild();
        self
    }

    pub fn with_family(mut self, profile: TemplateFamilyProfile) -> Self {
        self.families
            .retain(|f| !f.family.eq_ignore_ascii_case(&profile.family));
        self.families.push(profile);
        self
    }

    pub fn with_matching(mut self, matching: ArrayScanConfig) -> Self {
        self.matching = matching;
        self
    }

    pub fn with_min_name_length(mut self, min_name_length: usize) -> Self {
        self.matching.min_name_length = min_name_length.max(1);
        self
    }

    /// Compile an authored document
    pub fn compile(document: CatalogDocument) -> Result<CatalogCompilation, CatalogError> {
        if document.requirements.len() > MAX_REQUIREMENTS {
            return Err(CatalogError::Unusable {
                reason: format!(
                    "catalog declares {} requirements, maximum is {}",
                    document.requirements.len(),
                    MAX_REQUIREMENTS
                ),
            });
        }

        let mut issues = Vec::new();
        let mut requirements: Vec<Requirement> = Vec::new();
        let mut seen = BTreeSet::new();

        for spec in &document.requirements {
            let id = spec.id.trim();
            if id.is_empty() {
                issues.push(CatalogIssue::new(
                    None,
                    IssueKind::MissingField,
                    format!("requirement '{}' has an empty id", spec.name),
                ));
                continue;
            }
            if !seen.insert(id.to_string()) {
                issues.push(CatalogIssue::new(
                    Some(id),
                    IssueKind::DuplicateRequirement,
                    "duplicate requirement id; the first definition is kept",
                ));
                continue;
            }

            match compile_requirement(spec) {
                Ok(requirement) => {
                    if let Some(mismatch) = requirement.shape_error() {
                        issues.push(CatalogIssue::new(
                            Some(id),
                            IssueKind::ShapeMismatch,
                            mismatch.to_string(),
                        ));
                    }
                    requirements.push(requirement);
                }
                Err(mut rejected) => issues.append(&mut rejected),
            }
        }

        let mut catalog = Catalog {
            version: document.version,
            requirements,
            index: BTreeMap::new(),
            controls: ControlRegistry::new(),
            families: Vec::new(),
            matching: document.matching,
        };

        for control in &document.controls {
            catalog.controls.declare(control);
        }
        for (control_id, requirement_id) in catalog.rebuild() {
            issues.push(CatalogIssue::new(
                Some(&requirement_id),
                IssueKind::UnknownRequirementReference,
                format!(
                    "control '{}' references a requirement that is not loaded",
                    control_id
                ),
            ));
        }

        for profile in document.template_families {
            catalog = catalog.with_family(profile);
        }

        for issue in &issues {
            log_warning!(code = issue.kind.log_code(), &issue.message,
                "requirement_id" => issue.requirement_id.as_deref().unwrap_or("-"));
        }
        log_success!(
            codes::success::CATALOG_COMPILED,
            "Requirement catalog compiled",
            "version" => catalog.version,
            "requirements" => catalog.requirements.len(),
            "controls" => catalog.controls.len(),
            "families" => catalog.families.len(),
            "issues" => issues.len()
        );

        Ok(CatalogCompilation { catalog, issues })
    }

    pub fn from_json_str(content: &str) -> Result<CatalogCompilation, CatalogError> {
        Self::compile(CatalogDocument::from_json_str(content)?)
    }

    pub fn from_toml_str(content: &str) -> Result<CatalogCompilation, CatalogError> {
        Self::compile(CatalogDocument::from_toml_str(content)?)
    }

    /// Load and compile a catalog file (`.json` or `.toml`)
    pub fn load(path: &Path) -> Result<CatalogCompilation, CatalogError> {
        log_debug!("Loading requirement catalog", "path" => path.display());
        Self::compile(CatalogDocument::load(path)?)
    }

    /// Sort requirements, rebuild the id index and control links.
    /// Returns control references to requirements that are not loaded.
    fn rebuild(&mut self) -> Vec<(String, String)> {
        self.requirements.sort_by(|a, b| a.id.cmp(&b.id));
        self.index = self
            .requirements
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();

        for requirement in &self.requirements {
            for control_id in &requirement.control_ids {
                self.controls.link(control_id, &requirement.id);
            }
        }
        let known: BTreeSet<String> = self.index.keys().cloned().collect();
        let stale = self.controls.retain_requirements(&known);

        for requirement in &mut self.requirements {
            requirement.control_ids = self
                .controls
                .controls_for_requirement(&requirement.id)
                .into_iter()
                .map(|c| c.id.clone())
                .collect();
        }
        stale
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Requirements in id order
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.index.get(id).map(|&i| &self.requirements[i])
    }

    pub fn controls(&self) -> &ControlRegistry {
        &self.controls
    }

    pub fn families(&self) -> &[TemplateFamilyProfile] {
        &self.families
    }

    /// Family profile by name, ignoring case
    pub fn family(&self, name: &str) -> Option<&TemplateFamilyProfile> {
        self.families
            .iter()
            .find(|f| f.family.eq_ignore_ascii_case(name))
    }

    /// Family whose profile claims this `@odata.type`
    pub fn family_for_odata_type(&self, odata_type: &str) -> Option<&TemplateFamilyProfile> {
        self.families.iter().find(|f| f.matches_odata_type(odata_type))
    }

    pub fn matching(&self) -> &ArrayScanConfig {
        &self.matching
    }

    /// Add built-in profiles for families the catalog does not define itself
    pub fn merge_families<I>(mut self, builtins: I) -> Self
    where
        I: IntoIterator<Item = TemplateFamilyProfile>,
    {
        for profile in builtins {
            if self.family(&profile.family).is_none() {
                self.families.push(profile);
            }
        }
        self
    }

    pub fn evaluable_count(&self) -> usize {
        self.requirements.iter().filter(|r| r.is_evaluable()).count()
    }

    pub fn is_usable(&self) -> bool {
        self.evaluable_count() > 0
    }

    /// Refuse catalogs that cannot produce a single verdict
    pub fn ensure_usable(&self) -> Result<(), CatalogError> {
        if self.requirements.is_empty() {
            return Err(CatalogError::Unusable {
                reason: "catalog contains no valid requirements".to_string(),
            });
        }
        if !self.is_usable() {
            return Err(CatalogError::Unusable {
                reason: format!(
                    "none of the {} requirements has an operator compatible with its expected value",
                    self.requirements.len()
                ),
            });
        }
        Ok(())
    }
}

fn compile_requirement(spec: &RequirementSpec) -> Result<Requirement, Vec<CatalogIssue>> {
    let id = spec.id.trim();
    let mut issues = Vec::new();
    let mut reject = |kind: IssueKind, message: String| {
        issues.push(CatalogIssue::new(Some(id), kind, message));
    };

    if spec.name.trim().is_empty() {
        reject(IssueKind::MissingField, "requirement name is empty".to_string());
    }

    let setting_path = PathExpr::parse(&spec.setting_path)
        .map_err(|e| {
            reject(
                IssueKind::InvalidPath,
                format!("setting_path '{}': {}", spec.setting_path, e),
            )
        })
        .ok();

    let mut alternate_paths = Vec::with_capacity(spec.alternate_paths.len());
    for raw in &spec.alternate_paths {
        match PathExpr::parse(raw) {
            Ok(path) => alternate_paths.push(path),
            Err(e) => reject(IssueKind::InvalidPath, format!("alternate path '{}': {}", raw, e)),
        }
    }

    let operator = spec
        .operator
        .parse::<Operator>()
        .map_err(|e| reject(IssueKind::UnknownOperator, e))
        .ok();

    let expected_value = ExpectedValue::try_from(spec.expected_value.clone())
        .map_err(|e| reject(IssueKind::InvalidExpectedValue, e.to_string()))
        .ok();

    let platform = match spec.platform.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<Platform>().map(Some),
    }
    .map_err(|e| reject(IssueKind::UnknownPlatform, e))
    .ok();

    let alternate_names: Vec<String> = spec
        .alternate_names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect();

    let template_family = spec
        .template_family
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string);

    match (setting_path, operator, expected_value, platform) {
        (Some(setting_path), Some(operator), Some(expected_value), Some(platform))
            if issues.is_empty() =>
        {
            Ok(Requirement {
                id: id.to_string(),
                name: spec.name.trim().to_string(),
                control_ids: spec
                    .control_ids
                    .iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
                template_family,
                setting_path,
                alternate_paths,
                alternate_names,
                expected_value,
                operator,
                platform,
                confidence: spec.confidence,
                case_insensitive: spec.case_insensitive,
                description: spec.description.clone(),
                remediation: spec.remediation.clone(),
            })
        }
        _ => Err(issues),
    }
}
