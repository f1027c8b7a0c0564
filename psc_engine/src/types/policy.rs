//! Policy model: one configuration object pulled from a management plane

use psc_catalog::catalog::TemplateFamilyProfile;
use psc_catalog::Platform;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Closed set of policy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum PolicyType {
    DeviceConfiguration,
    CompliancePolicy,
    /// Settings catalog policy
    ConfigurationPolicy,
    EndpointSecurityIntent,
    AppProtection,
    ConditionalAccess,
    #[default]
    Other,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::DeviceConfiguration => "DeviceConfiguration",
            PolicyType::CompliancePolicy => "CompliancePolicy",
            PolicyType::ConfigurationPolicy => "ConfigurationPolicy",
            PolicyType::EndpointSecurityIntent => "EndpointSecurityIntent",
            PolicyType::AppProtection => "AppProtection",
            PolicyType::ConditionalAccess => "ConditionalAccess",
            PolicyType::Other => "Other",
        }
    }

    /// Classify from an `@odata.type` discriminator
    pub fn from_odata_type(odata_type: &str) -> Self {
        let name = odata_type_name(odata_type).to_ascii_lowercase();
        if name.contains("compliancepolicy") {
            PolicyType::CompliancePolicy
        } else if name == "devicemanagementconfigurationpolicy" {
            PolicyType::ConfigurationPolicy
        } else if name.starts_with("devicemanagementintent") {
            PolicyType::EndpointSecurityIntent
        } else if name.contains("managedappprotection") || name.contains("appprotectionpolicy") {
            PolicyType::AppProtection
        } else if name.contains("conditionalaccesspolicy") {
            PolicyType::ConditionalAccess
        } else if name.ends_with("configuration") {
            PolicyType::DeviceConfiguration
        } else {
            PolicyType::Other
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "deviceconfiguration" => Ok(PolicyType::DeviceConfiguration),
            "compliancepolicy" | "compliance" => Ok(PolicyType::CompliancePolicy),
            "configurationpolicy" | "settingscatalog" => Ok(PolicyType::ConfigurationPolicy),
            "endpointsecurityintent" | "endpointsecurity" | "intent" => {
                Ok(PolicyType::EndpointSecurityIntent)
            }
            "appprotection" | "appprotectionpolicy" => Ok(PolicyType::AppProtection),
            "conditionalaccess" | "conditionalaccesspolicy" => Ok(PolicyType::ConditionalAccess),
            "other" => Ok(PolicyType::Other),
            _ => Err(format!("unknown policy type '{}'", s)),
        }
    }
}

/// Type name with any `#microsoft.graph.` namespace stripped
fn odata_type_name(odata_type: &str) -> &str {
    let trimmed = odata_type.trim().trim_start_matches('#');
    trimmed.rsplit('.').next().unwrap_or(trimmed)
}

fn platform_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)^(windows|win10|ios|ipad|android|aosp|macos|mac)").ok())
        .as_ref()
}

/// Platform implied by an `@odata.type` discriminator
pub fn platform_from_odata_type(odata_type: &str) -> Option<Platform> {
    let name = odata_type_name(odata_type);
    let captures = platform_pattern()?.captures(name)?;
    match captures.get(1)?.as_str().to_ascii_lowercase().as_str() {
        "windows" | "win10" => Some(Platform::Windows),
        "ios" | "ipad" => Some(Platform::Ios),
        "android" | "aosp" => Some(Platform::Android),
        "macos" | "mac" => Some(Platform::MacOs),
        _ => None,
    }
}

/// Raw settings payload of a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyPayload {
    /// JSON text that still has to be parsed
    Raw(String),
    Parsed(Value),
}

/// One policy to evaluate; immutable during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub policy_type: PolicyType,
    #[serde(default, alias = "@odata.type")]
    pub odata_type: Option<String>,
    #[serde(default)]
    pub template_family: Option<String>,
    #[serde(default)]
    pub platform: Option<Platform>,
    pub payload: PolicyPayload,
}

impl Policy {
    pub fn new(id: impl Into<String>, name: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            policy_type: PolicyType::Other,
            odata_type: None,
            template_family: None,
            platform: None,
            payload: PolicyPayload::Parsed(payload),
        }
    }

    /// Policy whose payload is JSON text parsed at evaluation time
    pub fn from_raw(
        id: impl Into<String>,
        name: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            payload: PolicyPayload::Raw(raw.into()),
            ..Self::new(id, name, Value::Null)
        }
    }

    pub fn with_policy_type(mut self, policy_type: PolicyType) -> Self {
        self.policy_type = policy_type;
        self
    }

    pub fn with_odata_type(mut self, odata_type: impl Into<String>) -> Self {
        self.odata_type = Some(odata_type.into());
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

    /// Parsed payload document
    pub fn document(&self) -> Result<Cow<'_, Value>, serde_json::Error> {
        match &self.payload {
            PolicyPayload::Parsed(value) => Ok(Cow::Borrowed(value)),
            PolicyPayload::Raw(text) => serde_json::from_str(text).map(Cow::Owned),
        }
    }

    /// Declared `@odata.type`, falling back to the one inside a parsed payload
    pub fn effective_odata_type(&self) -> Option<&str> {
        if let Some(declared) = self.odata_type.as_deref() {
            return Some(declared);
        }
        match &self.payload {
            PolicyPayload::Parsed(value) => value.get("@odata.type")?.as_str(),
            PolicyPayload::Raw(_) => None,
        }
    }

    /// Fill in policy type, template family and platform when not supplied
    pub fn classify(mut self, families: &[TemplateFamilyProfile]) -> Self {
        let Some(odata_type) = self.effective_odata_type().map(str::to_string) else {
            return self;
        };

        if self.policy_type == PolicyType::Other {
            self.policy_type = PolicyType::from_odata_type(&odata_type);
        }
        if self.template_family.is_none() {
            self.template_family = families
                .iter()
                .find(|f| f.matches_odata_type(&odata_type))
                .map(|f| f.family.clone());
        }
        if self.platform.is_none() {
            self.platform =
                platform_from_odata_type(&odata_type).or_else(|| self.payload_platform());
        }
        self
    }

    /// Settings catalog payloads carry a `platforms` field
    fn payload_platform(&self) -> Option<Platform> {
        match &self.payload {
            PolicyPayload::Parsed(value) => value.get("platforms")?.as_str()?.parse().ok(),
            PolicyPayload::Raw(_) => None,
        }
    }
}
