//! Array scan strategy: fuzzy name match over `settings[]`-style arrays
//!
//! Each element of a configured array is read for a setting name (first
//! name key that resolves) and a value (first value key that resolves).
//! An exact normalized name match beats a substring match anywhere in the
//! scan. A substring match must clear the minimum name length on its
//! shorter side, and is refused when the element holds a plain boolean for
//! a requirement whose operator is not boolean: such elements are usually
//! the parent enable-flag of the setting actually wanted. Container names
//! like `value` only ever match exactly.

use super::traits::{
    ExtractionContext, ExtractionMatch, ExtractionStrategy, SettingTarget, StrategyKind,
};
use crate::resolution::{resolve, resolve_node};
use crate::types::SettingValue;
use psc_catalog::config::compile_time::extraction::{
    ARRAY_SCAN_CONFIDENCE, MAX_ARRAY_SCAN_ELEMENTS,
};
use psc_catalog::path::{is_generic_key, PathExpr, PathSegment};
use psc_catalog::Operator;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayScanStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameMatch {
    Exact,
    Substring,
}

impl NameMatch {
    fn as_str(&self) -> &'static str {
        match self {
            NameMatch::Exact => "exact",
            NameMatch::Substring => "substring",
        }
    }
}

struct Candidate {
    kind: NameMatch,
    raw_name: String,
    value: SettingValue,
    path: PathExpr,
}

/// Lower-cased ASCII alphanumerics only
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn classify(target: &str, candidate: &str, min_length: usize) -> Option<NameMatch> {
    if target.is_empty() || candidate.is_empty() {
        return None;
    }
    if target == candidate {
        return Some(NameMatch::Exact);
    }
    let shorter = target.len().min(candidate.len());
    if shorter >= min_length && (target.contains(candidate) || candidate.contains(target)) {
        Some(NameMatch::Substring)
    } else {
        None
    }
}

/// Values under a `...Json` key arrive as JSON text
fn decode_value(value_key: &PathExpr, value: SettingValue) -> SettingValue {
    let is_json_key = value_key
        .leaf_key()
        .map(|k| k.to_ascii_lowercase().ends_with("json"))
        .unwrap_or(false);
    match value {
        SettingValue::String(text) if is_json_key => serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|parsed| SettingValue::from_json(&parsed))
            .unwrap_or(SettingValue::String(text)),
        other => other,
    }
}

impl ArrayScanStrategy {
    fn element_name(ctx: &ExtractionContext<'_>, element: &Value) -> Option<String> {
        ctx.matching.name_keys.iter().find_map(|key| {
            resolve_node(element, key)
                .and_then(SettingValue::from_json)
                .filter(SettingValue::is_scalar)
                .map(|name| name.canonical_string())
        })
    }

    fn element_value<'m>(
        ctx: &ExtractionContext<'m>,
        element: &Value,
    ) -> Option<(SettingValue, &'m PathExpr)> {
        ctx.matching
            .value_keys
            .iter()
            .find_map(|key| resolve(element, key).map(|value| (decode_value(key, value), key)))
    }

    fn scan(
        &self,
        ctx: &ExtractionContext<'_>,
        target: &SettingTarget<'_>,
    ) -> Option<Candidate> {
        let wanted = normalize_name(target.name);
        let min_length = ctx.matching.min_name_length.max(1);
        let boolean_operator = target.requirement.operator == Operator::Boolean;
        let exact_only = is_generic_key(target.name);
        let mut substring_hit: Option<Candidate> = None;

        for array_key in &ctx.matching.array_keys {
            let Some(elements) = resolve_node(ctx.document, array_key).and_then(Value::as_array)
            else {
                continue;
            };

            for (index, element) in elements.iter().take(MAX_ARRAY_SCAN_ELEMENTS).enumerate() {
                let Some(raw_name) = Self::element_name(ctx, element) else {
                    continue;
                };
                let Some(kind) = classify(&wanted, &normalize_name(&raw_name), min_length) else {
                    continue;
                };
                if kind == NameMatch::Substring && exact_only {
                    continue;
                }
                let Some((value, value_key)) = Self::element_value(ctx, element) else {
                    continue;
                };

                if kind == NameMatch::Substring && value.is_boolean() && !boolean_operator {
                    continue;
                }

                let mut segments = array_key.segments().to_vec();
                segments.push(PathSegment::Index(index));
                segments.extend(value_key.segments().iter().cloned());
                let candidate = Candidate {
                    kind,
                    raw_name,
                    value,
                    path: PathExpr::from_segments(segments),
                };

                if kind == NameMatch::Exact {
                    return Some(candidate);
                }
                if substring_hit.is_none() {
                    substring_hit = Some(candidate);
                }
            }
        }
        substring_hit
    }
}

impl ExtractionStrategy for ArrayScanStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ArrayScan
    }

    fn confidence(&self) -> f64 {
        ARRAY_SCAN_CONFIDENCE
    }

    fn attempt(
        &self,
        ctx: &ExtractionContext<'_>,
        target: &SettingTarget<'_>,
    ) -> Option<ExtractionMatch> {
        let candidate = self.scan(ctx, target)?;
        Some(ExtractionMatch {
            value: candidate.value,
            rationale: format!(
                "setting name '{}' matched array entry '{}' ({} match)",
                target.name,
                candidate.raw_name,
                candidate.kind.as_str()
            ),
            path: candidate.path.render(),
            strategy: self.kind(),
            confidence: self.confidence(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Policy;
    use psc_catalog::catalog::{ArrayScanConfig, ExpectedValue, Requirement};
    use serde_json::json;

    fn requirement(path: &str, operator: Operator, expected: ExpectedValue) -> Requirement {
        Requirement::new("REQ", "Requirement", PathExpr::parse(path).unwrap(), operator, expected)
    }

    fn attempt(payload: Value, requirement: &Requirement) -> Option<ExtractionMatch> {
        let policy = Policy::new("p", "Policy", payload.clone());
        let matching = ArrayScanConfig::default();
        let ctx = ExtractionContext {
            policy: &policy,
            document: &payload,
            profile: None,
            matching: &matching,
        };
        ArrayScanStrategy.attempt(&ctx, &SettingTarget::primary(requirement))
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("BitLocker-Encrypt Device"), "bitlockerencryptdevice");
        assert_eq!(normalize_name("  "), "");
    }

    #[test]
    fn test_exact_match_preferred_over_earlier_substring() {
        let payload = json!({"settings": [
            {"displayName": "passwordMinimumLengthLegacy", "value": 4},
            {"displayName": "Password Minimum Length", "value": 12}
        ]});
        let req = requirement(
            "passwordMinimumLength",
            Operator::NumericExact,
            ExpectedValue::Number(12.0),
        );
        let found = attempt(payload, &req).unwrap();
        assert_eq!(found.value, SettingValue::Integer(12));
        assert_eq!(found.path, "settings[1].value");
        assert_eq!(found.confidence, ARRAY_SCAN_CONFIDENCE);
    }

    #[test]
    fn test_parent_boolean_guard() {
        let payload = json!({"settings": [
            {"displayName": "encryptionMethodEnabled", "value": true}
        ]});
        let equals = requirement(
            "encryptionMethod",
            Operator::Equals,
            ExpectedValue::Text("xtsAes256".into()),
        );
        assert!(attempt(payload.clone(), &equals).is_none());

        let boolean = requirement(
            "encryptionMethod",
            Operator::Boolean,
            ExpectedValue::Boolean(true),
        );
        assert!(attempt(payload, &boolean).is_some());
    }

    #[test]
    fn test_minimum_length_blocks_short_substrings() {
        let payload = json!({"settings": [{"displayName": "pin", "value": "x"}]});
        let req = requirement(
            "pinMinimumLength",
            Operator::Equals,
            ExpectedValue::Text("x".into()),
        );
        assert!(attempt(payload, &req).is_none());
    }

    #[test]
    fn test_value_json_is_decoded() {
        let payload = json!({"settings": [
            {"definitionId": "device_vendor_msft_defender_allowrealtimemonitoring",
             "valueJson": "{\"enabled\": 1}"}
        ]});
        let req = requirement(
            "allowRealtimeMonitoring",
            Operator::Equals,
            ExpectedValue::Text("1".into()),
        );
        let found = attempt(payload, &req).unwrap();
        assert_eq!(found.path, "settings[0].valueJson");
        assert!(matches!(found.value, SettingValue::Record(_)));
    }

    #[test]
    fn test_selector_path_ignores_unrelated_entries() {
        let payload = json!({"settings": [
            {"definitionId": "device_vendor_msft_defender_cpuloadfactor_value", "value": "50"}
        ]});
        let req = requirement(
            "settings[definitionId=device_vendor_msft_bitlocker_encryptionmethod].value",
            Operator::Equals,
            ExpectedValue::Text("xtsAes256".into()),
        );
        assert_eq!(
            req.setting_name(),
            "device_vendor_msft_bitlocker_encryptionmethod"
        );
        assert!(attempt(payload.clone(), &req).is_none());

        let related = json!({"settings": [
            {"definitionId": "device_vendor_msft_bitlocker_encryptionmethodbydrivetype",
             "value": "xtsAes256"}
        ]});
        let found = attempt(related, &req).unwrap();
        assert!(found.rationale.contains("substring"));
    }

    #[test]
    fn test_container_names_match_exactly_or_not_at_all() {
        let req = Requirement::new(
            "REQ",
            "Value",
            PathExpr::parse("settings[3].value").unwrap(),
            Operator::Equals,
            ExpectedValue::Text("50".into()),
        );
        let near_miss = json!({"settings": [
            {"definitionId": "device_vendor_msft_defender_cpuloadfactor_value", "value": "50"}
        ]});
        assert!(attempt(near_miss, &req).is_none());

        let exact = json!({"settings": [{"displayName": "value", "value": "50"}]});
        assert_eq!(attempt(exact, &req).unwrap().value, SettingValue::from("50"));
    }

    #[test]
    fn test_non_array_and_malformed_entries_are_skipped() {
        let req = requirement("firewallEnabled", Operator::Boolean, ExpectedValue::Boolean(true));
        assert!(attempt(json!({"settings": {"displayName": "firewallEnabled"}}), &req).is_none());
        assert!(attempt(json!({"settings": [1, "two", null, {"value": true}]}), &req).is_none());
        assert!(attempt(json!([]), &req).is_none());
    }
}
