//! Typed expected values
//!
//! Authored as plain JSON: a boolean, a number, a string, an array of
//! acceptable values, or a `{ "min": .., "max": .. }` range object.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Inclusive numeric bounds; either side may be open
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    /// Inclusive containment check
    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

impl fmt::Display for NumericRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(
                f,
                "between {} and {}",
                canonical_number(min),
                canonical_number(max)
            ),
            (Some(min), None) => write!(f, "at least {}", canonical_number(min)),
            (None, Some(max)) => write!(f, "at most {}", canonical_number(max)),
            (None, None) => write!(f, "unbounded"),
        }
    }
}

/// Expected value of a requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum ExpectedValue {
    Boolean(bool),
    Number(f64),
    Range(NumericRange),
    Text(String),
    /// Canonical string forms of the acceptable (or required) elements
    List(Vec<String>),
}

/// Raised when authored JSON cannot be read as an expected value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid expected value: {0}")]
pub struct InvalidExpectedValue(pub String);

impl ExpectedValue {
    /// Short name of the value shape, used in diagnostics
    pub fn shape_name(&self) -> &'static str {
        match self {
            ExpectedValue::Boolean(_) => "boolean",
            ExpectedValue::Number(_) => "number",
            ExpectedValue::Range(_) => "range",
            ExpectedValue::Text(_) => "string",
            ExpectedValue::List(_) => "array",
        }
    }

    /// Boolean reading: booleans, 0/1, and "true"/"false" (case-insensitive)
    pub fn as_bool_like(&self) -> Option<bool> {
        match self {
            ExpectedValue::Boolean(b) => Some(*b),
            ExpectedValue::Number(n) if *n == 0.0 => Some(false),
            ExpectedValue::Number(n) if *n == 1.0 => Some(true),
            ExpectedValue::Text(s) => parse_bool_text(s),
            _ => None,
        }
    }

    /// Numeric reading: numbers and numeric text
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExpectedValue::Number(n) => Some(*n),
            ExpectedValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Canonical strings for equality/membership comparison
    pub fn canonical_strings(&self) -> Vec<String> {
        match self {
            ExpectedValue::Boolean(b) => vec![b.to_string()],
            ExpectedValue::Number(n) => vec![canonical_number(*n)],
            ExpectedValue::Text(s) => vec![s.trim().to_string()],
            ExpectedValue::List(items) => items.clone(),
            ExpectedValue::Range(_) => Vec::new(),
        }
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::Boolean(b) => write!(f, "{}", b),
            ExpectedValue::Number(n) => write!(f, "{}", canonical_number(*n)),
            ExpectedValue::Range(r) => write!(f, "{}", r),
            ExpectedValue::Text(s) => write!(f, "\"{}\"", s),
            ExpectedValue::List(items) => write!(f, "one of [{}]", items.join(", ")),
        }
    }
}

/// Parse "true"/"false" text, ignoring case and surrounding whitespace
pub fn parse_bool_text(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Render a number the way it is compared as text: integral values without a fraction
pub fn canonical_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn scalar_to_canonical(value: &Value) -> Result<String, InvalidExpectedValue> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => n
            .as_f64()
            .map(canonical_number)
            .ok_or_else(|| InvalidExpectedValue(format!("unrepresentable number {}", n))),
        other => Err(InvalidExpectedValue(format!(
            "array elements must be scalars, found {}",
            other
        ))),
    }
}

fn bound(value: Option<&Value>, name: &str) -> Result<Option<f64>, InvalidExpectedValue> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| InvalidExpectedValue(format!("'{}' is not representable", name))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| {
                InvalidExpectedValue(format!("'{}' must be numeric, got \"{}\"", name, s))
            }),
        Some(other) => Err(InvalidExpectedValue(format!(
            "'{}' must be numeric, got {}",
            name, other
        ))),
    }
}

impl TryFrom<Value> for ExpectedValue {
    type Error = InvalidExpectedValue;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Err(InvalidExpectedValue(
                "expected value cannot be null".to_string(),
            )),
            Value::Bool(b) => Ok(ExpectedValue::Boolean(b)),
            Value::Number(n) => n
                .as_f64()
                .map(ExpectedValue::Number)
                .ok_or_else(|| InvalidExpectedValue(format!("unrepresentable number {}", n))),
            Value::String(s) => Ok(ExpectedValue::Text(s)),
            Value::Array(items) => items
                .iter()
                .map(scalar_to_canonical)
                .collect::<Result<Vec<_>, _>>()
                .map(ExpectedValue::List),
            Value::Object(map) => {
                if let Some(unknown) = map.keys().find(|k| *k != "min" && *k != "max") {
                    return Err(InvalidExpectedValue(format!(
                        "range objects accept only 'min' and 'max', found '{}'",
                        unknown
                    )));
                }
                Ok(ExpectedValue::Range(NumericRange {
                    min: bound(map.get("min"), "min")?,
                    max: bound(map.get("max"), "max")?,
                }))
            }
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<ExpectedValue> for Value {
    fn from(expected: ExpectedValue) -> Self {
        match expected {
            ExpectedValue::Boolean(b) => Value::Bool(b),
            ExpectedValue::Number(n) => number_value(n),
            ExpectedValue::Text(s) => Value::String(s),
            ExpectedValue::List(items) => {
                Value::Array(items.into_iter().map(Value::String).collect())
            }
            ExpectedValue::Range(range) => {
                let mut map = serde_json::Map::new();
                if let Some(min) = range.min {
                    map.insert("min".to_string(), number_value(min));
                }
                if let Some(max) = range.max {
                    map.insert("max".to_string(), number_value(max));
                }
                Value::Object(map)
            }
        }
    }
}
