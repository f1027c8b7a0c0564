//! Requirement definitions: authored form and compiled form

use super::expected::ExpectedValue;
use super::operator::{Operator, ShapeMismatch};
use crate::path::PathExpr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Device platform a policy or requirement applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Platform {
    Windows,
    Ios,
    Android,
    MacOs,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::MacOs => "macos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "windows" | "windows10" | "win10" | "windows11" => Ok(Platform::Windows),
            "ios" | "ipados" => Ok(Platform::Ios),
            "android" | "androidenterprise" | "androidforwork" | "aosp" => Ok(Platform::Android),
            "macos" | "mac" | "osx" => Ok(Platform::MacOs),
            _ => Err(format!("unknown platform '{}'", s)),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

/// How much the catalog author trusts a requirement mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthoringConfidence {
    #[serde(alias = "High", alias = "HIGH")]
    High,
    #[default]
    #[serde(alias = "Medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "Low", alias = "LOW")]
    Low,
}

impl AuthoringConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthoringConfidence::High => "high",
            AuthoringConfidence::Medium => "medium",
            AuthoringConfidence::Low => "low",
        }
    }
}

/// Requirement as written in a catalog document
///
/// Typed fields are left loose here so a single bad entry becomes a catalog
/// issue instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementSpec {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub control_ids: Vec<String>,
    #[serde(default)]
    pub template_family: Option<String>,
    pub setting_path: String,
    #[serde(default)]
    pub alternate_paths: Vec<String>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    pub expected_value: serde_json::Value,
    pub operator: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub confidence: AuthoringConfidence,
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub remediation: Option<String>,
}

/// Compiled, executable requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: String,
    pub name: String,
    pub control_ids: Vec<String>,
    pub template_family: Option<String>,
    pub setting_path: PathExpr,
    pub alternate_paths: Vec<PathExpr>,
    pub alternate_names: Vec<String>,
    pub expected_value: ExpectedValue,
    pub operator: Operator,
    pub platform: Option<Platform>,
    pub confidence: AuthoringConfidence,
    pub case_insensitive: bool,
    pub description: Option<String>,
    pub remediation: Option<String>,
}

impl Requirement {
    /// Minimal requirement; remaining fields take their defaults
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        setting_path: PathExpr,
        operator: Operator,
        expected_value: ExpectedValue,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            control_ids: Vec::new(),
            template_family: None,
            setting_path,
            alternate_paths: Vec::new(),
            alternate_names: Vec::new(),
            expected_value,
            operator,
            platform: None,
            confidence: AuthoringConfidence::default(),
            case_insensitive: false,
            description: None,
            remediation: None,
        }
    }

    pub fn with_controls(mut self, control_ids: &[&str]) -> Self {
        self.control_ids = control_ids.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_template_family(mut self, family: impl Into<String>) -> Self {
        self.template_family = Some(family.into());
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_alternate_path(mut self, path: PathExpr) -> Self {
        self.alternate_paths.push(path);
        self
    }

    pub fn with_alternate_name(mut self, name: impl Into<String>) -> Self {
        self.alternate_names.push(name.into());
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Operator/expected-value incompatibility, if any
    pub fn shape_error(&self) -> Option<ShapeMismatch> {
        self.operator.accepts(&self.expected_value).err()
    }

    pub fn is_evaluable(&self) -> bool {
        self.shape_error().is_none()
    }

    /// Setting name used for fuzzy matching and gap reports
    pub fn setting_name(&self) -> &str {
        self.setting_path.setting_key().unwrap_or(&self.name)
    }

    /// Remediation text, falling back to a generated instruction
    pub fn remediation_text(&self) -> String {
        self.remediation.clone().unwrap_or_else(|| {
            format!(
                "Configure '{}' ({}) to {}",
                self.name, self.setting_path, self.expected_value
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::expected::NumericRange;

    #[test]
    fn test_platform_parsing() {
        assert_eq!("Windows10".parse::<Platform>(), Ok(Platform::Windows));
        assert_eq!("iOS".parse::<Platform>(), Ok(Platform::Ios));
        assert_eq!("macOS".parse::<Platform>(), Ok(Platform::MacOs));
        assert_eq!("android-enterprise".parse::<Platform>(), Ok(Platform::Android));
        assert!("symbian".parse::<Platform>().is_err());
    }

    #[test]
    fn test_confidence_aliases() {
        let c: AuthoringConfidence = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(c, AuthoringConfidence::High);
        assert_eq!(AuthoringConfidence::default(), AuthoringConfidence::Medium);
    }

    #[test]
    fn test_shape_error_and_names() {
        let req = Requirement::new(
            "REQ-1",
            "Minimum PIN length",
            PathExpr::parse("passwordMinimumLength").unwrap(),
            Operator::NumericRange,
            ExpectedValue::Range(NumericRange::at_least(6.0)),
        );
        assert!(req.is_evaluable());
        assert_eq!(req.setting_name(), "passwordMinimumLength");
        let selected = Requirement {
            setting_path: PathExpr::parse("settings[definitionId=pin_minimum].value").unwrap(),
            ..req.clone()
        };
        assert_eq!(selected.setting_name(), "pin_minimum");
        let indexed = Requirement {
            setting_path: PathExpr::parse("settings[0].value").unwrap(),
            ..req.clone()
        };
        assert_eq!(indexed.setting_name(), "Minimum PIN length");
        assert!(req.remediation_text().contains("at least 6"));

        let broken = Requirement {
            expected_value: ExpectedValue::Text("six".into()),
            ..req
        };
        assert!(broken.shape_error().is_some());
    }
}
