//! # Operator Library
//!
//! Pure comparison functions between an extracted value and a requirement's
//! expected value. An actual value that cannot be read the way the operator
//! needs is non-compliant; an expected value the operator cannot evaluate is
//! a configuration error.

use crate::execution::error::EvaluationError;
use crate::types::SettingValue;
use psc_catalog::catalog::{ExpectedValue, NumericRange, Operator};
use psc_catalog::config::compile_time::evaluation::NUMERIC_EPSILON;

/// Per-requirement comparison options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationOptions {
    pub case_insensitive: bool,
}

impl EvaluationOptions {
    pub fn case_insensitive(case_insensitive: bool) -> Self {
        Self { case_insensitive }
    }

    fn normalize(&self, text: &str) -> String {
        let trimmed = text.trim();
        if self.case_insensitive {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        }
    }
}

/// Evaluate `actual` against `expected` using `operator`
pub fn evaluate(
    actual: &SettingValue,
    expected: &ExpectedValue,
    operator: Operator,
    options: EvaluationOptions,
) -> Result<bool, EvaluationError> {
    operator.accepts(expected)?;

    let verdict = match (operator, expected) {
        (Operator::Boolean, _) => expected
            .as_bool_like()
            .map(|wanted| boolean(actual, wanted))
            .unwrap_or(false),
        (Operator::Equals, _) => equals(actual, &expected.canonical_strings(), options),
        (Operator::NumericRange, ExpectedValue::Range(range)) => numeric_range(actual, range),
        (Operator::NumericExact, _) => expected
            .as_number()
            .map(|wanted| numeric_exact(actual, wanted))
            .unwrap_or(false),
        (Operator::Contains, _) => contains(actual, &expected.canonical_strings(), options),
        (Operator::NumericRange, _) => false,
    };
    Ok(verdict)
}

/// Both sides coerced to booleans
pub fn boolean(actual: &SettingValue, expected: bool) -> bool {
    actual.as_bool_like() == Some(expected)
}

/// Canonical-string equality with any of `accepted`
pub fn equals(actual: &SettingValue, accepted: &[String], options: EvaluationOptions) -> bool {
    if !actual.is_scalar() {
        return false;
    }
    let actual = options.normalize(&actual.canonical_string());
    accepted.iter().any(|candidate| options.normalize(candidate) == actual)
}

/// Inclusive bounds
pub fn numeric_range(actual: &SettingValue, range: &NumericRange) -> bool {
    actual.as_number().map(|n| range.contains(n)).unwrap_or(false)
}

pub fn numeric_exact(actual: &SettingValue, expected: f64) -> bool {
    actual
        .as_number()
        .map(|n| (n - expected).abs() <= NUMERIC_EPSILON)
        .unwrap_or(false)
}

/// Every required element present in `actual`; a scalar is a one-element collection
pub fn contains(actual: &SettingValue, required: &[String], options: EvaluationOptions) -> bool {
    let present: Vec<String> = actual
        .elements()
        .into_iter()
        .filter(|element| element.is_scalar())
        .map(|element| options.normalize(&element.canonical_string()))
        .collect();
    required
        .iter()
        .all(|wanted| present.contains(&options.normalize(wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const STRICT: EvaluationOptions = EvaluationOptions {
        case_insensitive: false,
    };

    fn eval(actual: SettingValue, expected: ExpectedValue, operator: Operator) -> bool {
        evaluate(&actual, &expected, operator, STRICT).unwrap()
    }

    #[test]
    fn test_boolean_coercion() {
        let yes = ExpectedValue::Boolean(true);
        assert!(eval(SettingValue::Boolean(true), yes.clone(), Operator::Boolean));
        assert!(eval(SettingValue::Integer(1), yes.clone(), Operator::Boolean));
        assert!(eval(SettingValue::from("True"), yes.clone(), Operator::Boolean));
        assert!(!eval(SettingValue::from("enabled"), yes.clone(), Operator::Boolean));
        assert!(!eval(SettingValue::Boolean(false), yes, Operator::Boolean));
        assert!(eval(
            SettingValue::Integer(0),
            ExpectedValue::Text("false".into()),
            Operator::Boolean
        ));
    }

    #[test]
    fn test_range_boundaries() {
        let at_least_5 = ExpectedValue::Range(NumericRange::at_least(5.0));
        assert!(eval(SettingValue::Integer(5), at_least_5.clone(), Operator::NumericRange));
        assert!(!eval(SettingValue::Integer(4), at_least_5, Operator::NumericRange));

        let at_most_10 = ExpectedValue::Range(NumericRange::at_most(10.0));
        assert!(eval(SettingValue::Integer(10), at_most_10.clone(), Operator::NumericRange));
        assert!(!eval(SettingValue::Integer(11), at_most_10, Operator::NumericRange));

        let between = ExpectedValue::Range(NumericRange::new(Some(5.0), Some(10.0)));
        assert!(eval(SettingValue::Integer(5), between.clone(), Operator::NumericRange));
        assert!(eval(SettingValue::Integer(10), between.clone(), Operator::NumericRange));
        assert!(!eval(SettingValue::Integer(4), between.clone(), Operator::NumericRange));
        assert!(!eval(SettingValue::Integer(11), between.clone(), Operator::NumericRange));
        assert!(eval(SettingValue::from(" 7 "), between.clone(), Operator::NumericRange));
        assert!(!eval(SettingValue::from("seven"), between, Operator::NumericRange));
    }

    #[test]
    fn test_equals_array_is_or() {
        let accepted = ExpectedValue::List(vec!["A".into(), "B".into()]);
        assert!(eval(SettingValue::from("A"), accepted.clone(), Operator::Equals));
        assert!(eval(SettingValue::from("B"), accepted.clone(), Operator::Equals));
        assert!(!eval(SettingValue::from("C"), accepted, Operator::Equals));
    }

    #[test]
    fn test_equals_case_and_whitespace() {
        let expected = ExpectedValue::Text("XTS-AES256".into());
        assert!(eval(SettingValue::from("  XTS-AES256 "), expected.clone(), Operator::Equals));
        assert!(!eval(SettingValue::from("xts-aes256"), expected.clone(), Operator::Equals));
        assert!(evaluate(
            &SettingValue::from("xts-aes256"),
            &expected,
            Operator::Equals,
            EvaluationOptions::case_insensitive(true)
        )
        .unwrap());
        assert!(eval(SettingValue::Integer(6), ExpectedValue::Number(6.0), Operator::Equals));
    }

    #[test]
    fn test_numeric_exact() {
        assert!(eval(SettingValue::Float(6.0), ExpectedValue::Number(6.0), Operator::NumericExact));
        assert!(eval(SettingValue::from("6"), ExpectedValue::Number(6.0), Operator::NumericExact));
        assert!(!eval(
            SettingValue::Integer(7),
            ExpectedValue::Number(6.0),
            Operator::NumericExact
        ));
    }

    #[test]
    fn test_contains() {
        let required = ExpectedValue::List(vec!["tls1.2".into(), "tls1.3".into()]);
        let actual =
            SettingValue::Collection(vec!["tls1.3".into(), "tls1.2".into(), "ssl3".into()]);
        assert!(eval(actual, required.clone(), Operator::Contains));

        let partial = SettingValue::Collection(vec!["tls1.2".into()]);
        assert!(!eval(partial, required, Operator::Contains));

        let scalar = SettingValue::from("block");
        assert!(eval(scalar, ExpectedValue::Text("block".into()), Operator::Contains));
    }

    #[test]
    fn test_shape_mismatch_is_configuration_error() {
        let result = evaluate(
            &SettingValue::Integer(5),
            &ExpectedValue::Text("five".into()),
            Operator::NumericRange,
            STRICT,
        );
        assert_matches!(result, Err(EvaluationError::Configuration(_)));
    }

    #[test]
    fn test_evaluation_is_pure() {
        let actual = SettingValue::Collection(vec!["a".into()]);
        let expected = ExpectedValue::List(vec!["a".into()]);
        let first = evaluate(&actual, &expected, Operator::Contains, STRICT).unwrap();
        let second = evaluate(&actual, &expected, Operator::Contains, STRICT).unwrap();
        assert_eq!(first, second);
        assert_eq!(actual, SettingValue::Collection(vec!["a".into()]));
    }
}
