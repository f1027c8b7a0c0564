//! Runtime setting values extracted from policy payloads

use psc_catalog::catalog::{canonical_number, parse_bool_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A present (non-null) value found in a policy payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Collection(Vec<SettingValue>),
    Record(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    /// Convert a JSON value; `null` is absent
    ///
    /// Null members of arrays and objects are dropped.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(SettingValue::Boolean(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(SettingValue::Integer(i)),
                None => n.as_f64().map(SettingValue::Float),
            },
            Value::String(s) => Some(SettingValue::String(s.clone())),
            Value::Array(items) => Some(SettingValue::Collection(
                items.iter().filter_map(SettingValue::from_json).collect(),
            )),
            Value::Object(map) => Some(SettingValue::Record(
                map.iter()
                    .filter_map(|(k, v)| SettingValue::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Boolean(b) => Value::Bool(*b),
            SettingValue::Integer(i) => Value::from(*i),
            SettingValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SettingValue::String(s) => Value::String(s.clone()),
            SettingValue::Collection(items) => {
                Value::Array(items.iter().map(SettingValue::to_json).collect())
            }
            SettingValue::Record(map) => Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Boolean(_) => "boolean",
            SettingValue::Integer(_) => "integer",
            SettingValue::Float(_) => "float",
            SettingValue::String(_) => "string",
            SettingValue::Collection(_) => "collection",
            SettingValue::Record(_) => "record",
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, SettingValue::Boolean(_))
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, SettingValue::Collection(_) | SettingValue::Record(_))
    }

    /// Boolean reading: booleans, numeric 0/1, "true"/"false" in any case
    pub fn as_bool_like(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(b) => Some(*b),
            SettingValue::Integer(0) => Some(false),
            SettingValue::Integer(1) => Some(true),
            SettingValue::Float(f) if *f == 0.0 => Some(false),
            SettingValue::Float(f) if *f == 1.0 => Some(true),
            SettingValue::String(s) => parse_bool_text(s),
            _ => None,
        }
    }

    /// Numeric reading: numbers and trimmed numeric strings
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SettingValue::Integer(i) => Some(*i as f64),
            SettingValue::Float(f) if f.is_finite() => Some(*f),
            SettingValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Text used for equality comparison
    pub fn canonical_string(&self) -> String {
        match self {
            SettingValue::Boolean(b) => b.to_string(),
            SettingValue::Integer(i) => i.to_string(),
            SettingValue::Float(f) => canonical_number(*f),
            SettingValue::String(s) => s.trim().to_string(),
            SettingValue::Collection(_) | SettingValue::Record(_) => self.to_json().to_string(),
        }
    }

    /// Members of a collection; a scalar is its own single member
    pub fn elements(&self) -> Vec<&SettingValue> {
        match self {
            SettingValue::Collection(items) => items.iter().collect(),
            other => vec![other],
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::String(s) => write!(f, "\"{}\"", s),
            other => f.write_str(&other.canonical_string()),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Boolean(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Integer(i)
    }
}

impl From<f64> for SettingValue {
    fn from(f: f64) -> Self {
        SettingValue::Float(f)
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::String(s)
    }
}
