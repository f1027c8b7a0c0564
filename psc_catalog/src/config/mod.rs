//! Configuration module
//!
//! `constants` holds compile-time limits and tuning values; `runtime` holds
//! user preferences loaded from TOML and `PSC_*` environment variables.

pub mod constants;
pub mod runtime;

pub use constants::compile_time;
pub use runtime::{
    ConfigError, EngineConfig, ExtractionPreferences, LoggingPreferences, RunnerPreferences,
    SourcePreferences,
};

/// Build information and configuration metadata
pub mod build_info {
    /// Returns the configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("PSC_BUILD_PROFILE").unwrap_or("development")
    }

    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
