//! # Runner Configuration

use psc_catalog::config::compile_time::runner::MAX_WORKERS;
use psc_catalog::config::runtime::default_worker_count;
use psc_catalog::EngineConfig;

/// Configuration for the batch runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Upper bound on scoped worker threads
    pub max_workers: usize,

    /// Report isolated per-policy failures as a failed run
    pub fail_on_policy_errors: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_worker_count(),
            fail_on_policy_errors: false,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner settings from a loaded engine configuration
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self::default()
            .with_max_workers(config.runner.max_workers)
            .with_fail_on_policy_errors(config.runner.fail_on_policy_errors)
    }

    /// Set maximum worker threads, clamped to `1..=MAX_WORKERS`
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.clamp(1, MAX_WORKERS);
        self
    }

    pub fn with_fail_on_policy_errors(mut self, fail: bool) -> Self {
        self.fail_on_policy_errors = fail;
        self
    }
}
