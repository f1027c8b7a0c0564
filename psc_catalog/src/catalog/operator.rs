//! Comparison operators and their expected-value contracts

use super::expected::ExpectedValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comparison operator applied by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Boolean,
    Equals,
    NumericRange,
    NumericExact,
    #[serde(alias = "array_membership")]
    Contains,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Boolean => "boolean",
            Operator::Equals => "equals",
            Operator::NumericRange => "numeric_range",
            Operator::NumericExact => "numeric_exact",
            Operator::Contains => "contains",
        }
    }

    /// Check that `expected` has a shape this operator can evaluate
    pub fn accepts(&self, expected: &ExpectedValue) -> Result<(), ShapeMismatch> {
        let mismatch = |reason: &str| ShapeMismatch {
            operator: *self,
            shape: expected.shape_name(),
            reason: reason.to_string(),
        };

        match self {
            Operator::Boolean => expected
                .as_bool_like()
                .map(|_| ())
                .ok_or_else(|| mismatch("boolean requires true/false, 0/1 or \"true\"/\"false\"")),
            Operator::NumericRange => match expected {
                ExpectedValue::Range(range) if range.is_unbounded() => {
                    Err(mismatch("numeric_range requires at least one of min or max"))
                }
                ExpectedValue::Range(range) => {
                    let finite = range.min.map_or(true, f64::is_finite)
                        && range.max.map_or(true, f64::is_finite);
                    if !finite {
                        return Err(mismatch("range bounds must be finite numbers"));
                    }
                    match (range.min, range.max) {
                        (Some(min), Some(max)) if min > max => {
                            Err(mismatch("range min is greater than max"))
                        }
                        _ => Ok(()),
                    }
                }
                _ => Err(mismatch("numeric_range requires a {min, max} object")),
            },
            Operator::NumericExact => expected
                .as_number()
                .map(|_| ())
                .ok_or_else(|| mismatch("numeric_exact requires a number or numeric text")),
            Operator::Equals | Operator::Contains => match expected {
                ExpectedValue::Range(_) => {
                    Err(mismatch("ranges are only valid with numeric_range"))
                }
                ExpectedValue::List(items) if items.is_empty() => {
                    Err(mismatch("array expected values must not be empty"))
                }
                _ => Ok(()),
            },
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "boolean" => Ok(Operator::Boolean),
            "equals" => Ok(Operator::Equals),
            "numeric_range" => Ok(Operator::NumericRange),
            "numeric_exact" => Ok(Operator::NumericExact),
            "contains" | "array_membership" => Ok(Operator::Contains),
            other => Err(format!("unknown operator '{}'", other)),
        }
    }
}

/// An operator paired with an expected value it cannot evaluate
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("operator '{operator}' cannot evaluate a {shape} expected value: {reason}")]
pub struct ShapeMismatch {
    pub operator: Operator,
    pub shape: &'static str,
    pub reason: String,
}
