//! # Public API
//!
//! Batch runner, its configuration and run-level errors.

pub mod config;
pub mod errors;
pub mod runner;

pub use config::RunnerConfig;
pub use errors::RunnerError;
pub use runner::BatchRunner;
