//! # Compliance Evaluation
//!
//! Operator library and the evaluator that turns extraction results into
//! compliance checks.

pub mod error;
pub mod evaluator;
pub mod operators;

pub use error::EvaluationError;
pub use evaluator::ComplianceEvaluator;
pub use operators::{
    boolean, contains, equals, evaluate, numeric_exact, numeric_range, EvaluationOptions,
};
