//! # Setting Path Expressions
//!
//! Compiled form of the path strings authored in the requirement catalog.
//!
//! Supported syntax:
//! - dot-separated keys: `a.b.c`
//! - array index: `settings[2].value`
//! - quoted keys for keys containing dots: `['@odata.type']`
//! - key/value selection across array elements: `settings[definitionId=device_vendor_x].value`
//! - wildcard across array elements: `rules[*].action`

mod error;
mod parser;

pub use error::PathError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step of a compiled path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key lookup
    Key(String),
    /// Zero-based array index
    Index(usize),
    /// Every element of an array
    Wildcard,
    /// First array element whose `key` field equals `value`
    Select { key: String, value: String },
}

impl PathSegment {
    fn needs_quoting(key: &str) -> bool {
        key.is_empty()
            || key
                .chars()
                .any(|c| matches!(c, '.' | '[' | ']' | '=' | '\'' | '"'))
    }

    fn quote(text: &str) -> String {
        if text.contains('\'') {
            format!("\"{}\"", text)
        } else {
            format!("'{}'", text)
        }
    }
}

/// Container keys that say where a value sits, not which setting it is
const GENERIC_KEYS: &[&str] = &[
    "value",
    "values",
    "valuejson",
    "setting",
    "settings",
    "settinginstance",
    "settingvalue",
    "simplesettingvalue",
    "choicesettingvalue",
];

/// True for keys like `value` or `settingInstance`, ignoring case and punctuation
pub fn is_generic_key(key: &str) -> bool {
    let normalized: String = key
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    GENERIC_KEYS.contains(&normalized.as_str())
}

/// A parsed, validated path expression
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PathExpr {
    segments: Vec<PathSegment>,
}

impl PathExpr {
    /// Parse a path expression
    pub fn parse(input: &str) -> Result<Self, PathError> {
        parser::parse(input).map(|segments| Self { segments })
    }

    /// Build directly from segments
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Single-key path
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(name.into())],
        }
    }

    /// Plain key chain, no parsing involved
    pub fn keys(keys: &[&str]) -> Self {
        Self {
            segments: keys.iter().map(|k| PathSegment::Key(k.to_string())).collect(),
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `prefix` followed by this path
    pub fn with_prefix(&self, prefix: &PathExpr) -> PathExpr {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        PathExpr { segments }
    }

    /// This path followed by `suffix`
    pub fn join(&self, suffix: &PathExpr) -> PathExpr {
        suffix.with_prefix(self)
    }

    /// Last key segment, used as the display name of the addressed setting
    pub fn leaf_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(k) => Some(k.as_str()),
            _ => None,
        })
    }

    /// Most specific name in the path
    ///
    /// Walks back from the leaf, skipping indices, wildcards and container
    /// keys such as `value` or `settings`. A selector contributes the value
    /// it selects on, so `settings[definitionId=x].value` names `x`.
    pub fn setting_key(&self) -> Option<&str> {
        self.segments.iter().rev().find_map(|segment| match segment {
            PathSegment::Key(k) if !is_generic_key(k) => Some(k.as_str()),
            PathSegment::Select { value, .. } if !value.is_empty() => Some(value.as_str()),
            _ => None,
        })
    }

    /// Canonical textual form
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if PathSegment::needs_quoting(k) => {
                    out.push('[');
                    out.push_str(&PathSegment::quote(k));
                    out.push(']');
                }
                PathSegment::Key(k) => {
                    if i > 0 {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                PathSegment::Index(n) => out.push_str(&format!("[{}]", n)),
                PathSegment::Wildcard => out.push_str("[*]"),
                PathSegment::Select { key, value } => {
                    let key = if PathSegment::needs_quoting(key) {
                        PathSegment::quote(key)
                    } else {
                        key.clone()
                    };
                    let value = if value.contains(']') || PathSegment::needs_quoting(value) {
                        PathSegment::quote(value)
                    } else {
                        value.clone()
                    };
                    out.push_str(&format!("[{}={}]", key, value));
                }
            }
        }
        out
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl FromStr for PathExpr {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PathExpr {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PathExpr> for String {
    fn from(path: PathExpr) -> Self {
        path.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_is_reparseable() {
        for input in [
            "bitLockerEnabled",
            "a.b.c",
            "settings[2].value",
            "['@odata.type']",
            "settings[definitionId=device_vendor_msft_x].value",
            "rules[*].action",
            "outer['dotted.key'].inner",
        ] {
            let parsed = PathExpr::parse(input).unwrap();
            let reparsed = PathExpr::parse(&parsed.render()).unwrap();
            assert_eq!(parsed, reparsed, "render of {}", input);
        }
    }

    #[test]
    fn test_with_prefix() {
        let path = PathExpr::parse("bitLockerEnabled").unwrap();
        let prefix = PathExpr::parse("settingsDelta[0].valueJson").unwrap();
        assert_eq!(
            path.with_prefix(&prefix).render(),
            "settingsDelta[0].valueJson.bitLockerEnabled"
        );
    }

    #[test]
    fn test_leaf_key() {
        let path = PathExpr::parse("settings[definitionId=abc].value").unwrap();
        assert_eq!(path.leaf_key(), Some("value"));
        assert_eq!(PathExpr::parse("[0]").unwrap().leaf_key(), None);
    }

    #[test]
    fn test_setting_key_skips_containers() {
        let selected = PathExpr::parse(
            "settings[definitionId=device_vendor_msft_bitlocker_encryptionmethod].value",
        )
        .unwrap();
        assert_eq!(
            selected.setting_key(),
            Some("device_vendor_msft_bitlocker_encryptionmethod")
        );
        let nested = PathExpr::parse("bitLockerSystemDrivePolicy.encryptionMethod").unwrap();
        assert_eq!(nested.setting_key(), Some("encryptionMethod"));
        let instance =
            PathExpr::parse("firewall.settingInstance.simpleSettingValue.value").unwrap();
        assert_eq!(instance.setting_key(), Some("firewall"));
        assert_eq!(PathExpr::parse("settings[2].value").unwrap().setting_key(), None);
        assert!(is_generic_key("valueJson"));
        assert!(!is_generic_key("valueType"));
    }

    #[test]
    fn test_serde_as_string() {
        let path: PathExpr = serde_json::from_str("\"a.b[1]\"").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"a.b[1]\"");
        assert!(serde_json::from_str::<PathExpr>("\"a..b\"").is_err());
    }
}
