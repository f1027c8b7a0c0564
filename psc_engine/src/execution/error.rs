use psc_catalog::catalog::ShapeMismatch;

/// Errors from the compliance evaluator
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaluationError {
    /// The requirement's operator cannot evaluate its expected value
    #[error("Configuration error: {0}")]
    Configuration(#[from] ShapeMismatch),
}

impl EvaluationError {
    pub fn log_code(&self) -> psc_catalog::logging::Code {
        match self {
            EvaluationError::Configuration(_) => {
                psc_catalog::logging::codes::evaluation::CONFIGURATION_ERROR
            }
        }
    }
}
