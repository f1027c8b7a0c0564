//! Template family profiles and array-scan tuning
//!
//! A template family groups policy payloads that share a shape. Its profile
//! tells the template-path strategy where a family nests its settings, and
//! which `@odata.type` discriminators classify a policy into the family.

use crate::config::compile_time::extraction::DEFAULT_MIN_NAME_MATCH_LENGTH;
use crate::path::PathExpr;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Path rewriting rules for one template family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFamilyProfile {
    pub family: String,

    /// `@odata.type` values that classify a policy into this family
    #[serde(default)]
    pub odata_types: Vec<String>,

    /// Containers tried, in order, in front of the requirement's own path
    #[serde(default)]
    pub prefixes: Vec<PathExpr>,

    /// Direct rewrites keyed by the requirement's rendered setting path
    #[serde(default)]
    pub aliases: BTreeMap<String, PathExpr>,
}

impl TemplateFamilyProfile {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            odata_types: Vec::new(),
            prefixes: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }

    pub fn with_odata_type(mut self, odata_type: impl Into<String>) -> Self {
        self.odata_types.push(odata_type.into());
        self
    }

    pub fn with_prefix(mut self, prefix: PathExpr) -> Self {
        self.prefixes.push(prefix);
        self
    }

    pub fn with_alias(mut self, setting_path: &PathExpr, target: PathExpr) -> Self {
        self.aliases.insert(setting_path.render(), target);
        self
    }

    /// Candidate rewrites for `path`: the alias first, then each prefix
    pub fn candidate_paths(&self, path: &PathExpr) -> Vec<PathExpr> {
        let mut candidates = Vec::with_capacity(self.prefixes.len() + 1);
        if let Some(alias) = self.aliases.get(&path.render()) {
            candidates.push(alias.clone());
        }
        candidates.extend(self.prefixes.iter().map(|prefix| path.with_prefix(prefix)));
        candidates
    }

    pub fn matches_odata_type(&self, odata_type: &str) -> bool {
        let needle = odata_type.trim().trim_start_matches('#');
        self.odata_types
            .iter()
            .any(|t| t.trim_start_matches('#').eq_ignore_ascii_case(needle))
    }
}

/// Tuning for the `settings[]` array scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrayScanConfig {
    /// Minimum normalized length of the shorter name for substring matches
    pub min_name_length: usize,

    /// Paths to arrays of setting records
    pub array_keys: Vec<PathExpr>,

    /// Paths, relative to an element, holding the setting name
    pub name_keys: Vec<PathExpr>,

    /// Paths, relative to an element, holding the setting value
    pub value_keys: Vec<PathExpr>,
}

impl Default for ArrayScanConfig {
    fn default() -> Self {
        Self {
            min_name_length: DEFAULT_MIN_NAME_MATCH_LENGTH,
            array_keys: vec![PathExpr::key("settings")],
            name_keys: vec![
                PathExpr::key("displayName"),
                PathExpr::key("definitionId"),
                PathExpr::keys(&["settingInstance", "settingDefinitionId"]),
            ],
            value_keys: vec![
                PathExpr::key("value"),
                PathExpr::key("valueJson"),
                PathExpr::keys(&["settingInstance", "simpleSettingValue", "value"]),
                PathExpr::keys(&["settingInstance", "choiceSettingValue", "value"]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_paths_order() {
        let path = PathExpr::parse("bitLockerEnabled").unwrap();
        let profile = TemplateFamilyProfile::new("endpointProtection")
            .with_prefix(PathExpr::parse("deviceSettings").unwrap())
            .with_prefix(PathExpr::parse("settingsDelta[0]").unwrap())
            .with_alias(&path, PathExpr::parse("bitLocker.enabled").unwrap());

        let rendered: Vec<String> = profile
            .candidate_paths(&path)
            .iter()
            .map(|p| p.render())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "bitLocker.enabled",
                "deviceSettings.bitLockerEnabled",
                "settingsDelta[0].bitLockerEnabled"
            ]
        );
    }

    #[test]
    fn test_odata_matching() {
        let profile = TemplateFamilyProfile::new("windows10General")
            .with_odata_type("#microsoft.graph.windows10GeneralConfiguration");
        assert!(profile.matches_odata_type("microsoft.graph.Windows10GeneralConfiguration"));
        assert!(!profile.matches_odata_type("#microsoft.graph.iosGeneralDeviceConfiguration"));
    }

    #[test]
    fn test_profile_from_json() {
        let profile: TemplateFamilyProfile = serde_json::from_str(
            r#"{"family": "settingsCatalog", "prefixes": ["settings[*].settingInstance"],
                "aliases": {"a.b": "c['d.e']"}}"#,
        )
        .unwrap();
        assert_eq!(profile.prefixes.len(), 1);
        assert_eq!(profile.aliases["a.b"].render(), "c['d.e']");
    }

    #[test]
    fn test_array_scan_defaults() {
        let config = ArrayScanConfig::default();
        assert_eq!(config.min_name_length, DEFAULT_MIN_NAME_MATCH_LENGTH);
        assert_eq!(config.array_keys[0].render(), "settings");
        assert!(config
            .value_keys
            .iter()
            .any(|p| p.render() == "settingInstance.choiceSettingValue.value"));
    }
}
