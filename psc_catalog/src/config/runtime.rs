// RUNTIME PREFERENCES (User Experience)
//
// Every field falls back to a PSC_* environment variable, then to a built-in
// default. Values present in a TOML configuration file take precedence.

use super::compile_time::{extraction, runner, source};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[serde(alias = "warn")]
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub fn to_events_log_level(self) -> crate::logging::LogLevel {
        match self {
            LogLevel::Error => crate::logging::LogLevel::Error,
            LogLevel::Warning => crate::logging::LogLevel::Warning,
            LogLevel::Info => crate::logging::LogLevel::Info,
            LogLevel::Debug => crate::logging::LogLevel::Debug,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Minimum level emitted by the global logger
    pub min_log_level: LogLevel,

    /// Emit one JSON object per event instead of text lines
    pub use_structured_logging: bool,

    /// Hand events to the `log` facade (binaries install the backend)
    pub forward_to_log_facade: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            min_log_level: env::var("PSC_LOG_LEVEL")
                .ok()
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),
            use_structured_logging: env_parse("PSC_STRUCTURED_LOGGING").unwrap_or(false),
            forward_to_log_facade: env_parse("PSC_LOG_FACADE").unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerPreferences {
    /// Upper bound on worker threads used by the batch runner
    pub max_workers: usize,

    /// Treat any isolated per-policy failure as a failed run (CLI exit code)
    pub fail_on_policy_errors: bool,
}

impl Default for RunnerPreferences {
    fn default() -> Self {
        Self {
            max_workers: env_parse("PSC_MAX_WORKERS").unwrap_or_else(default_worker_count),
            fail_on_policy_errors: env_parse("PSC_FAIL_ON_POLICY_ERRORS").unwrap_or(false),
        }
    }
}

/// Available parallelism capped at the compile-time default
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().min(runner::DEFAULT_MAX_WORKERS_CAP))
        .unwrap_or(4)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPreferences {
    /// Overrides the catalog's minimum fuzzy-match name length when set
    pub min_name_match_length: Option<usize>,
}

impl Default for ExtractionPreferences {
    fn default() -> Self {
        Self {
            min_name_match_length: env_parse("PSC_MIN_NAME_MATCH_LENGTH"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcePreferences {
    /// Seconds a cached policy snapshot stays fresh
    pub cache_ttl_seconds: u64,
}

impl Default for SourcePreferences {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: env_parse("PSC_CACHE_TTL_SECONDS")
                .unwrap_or(source::DEFAULT_CACHE_TTL_SECONDS),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LoggingPreferences,
    pub runner: RunnerPreferences,
    pub extraction: ExtractionPreferences,
    pub source: SourcePreferences,
}

impl EngineConfig {
    /// Parse and validate a TOML configuration document
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` when given, otherwise use environment-derived defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.max_workers == 0 || self.runner.max_workers > runner::MAX_WORKERS {
            return Err(ConfigError::Invalid {
                field: "runner.max_workers",
                reason: format!(
                    "must be between 1 and {}, got {}",
                    runner::MAX_WORKERS,
                    self.runner.max_workers
                ),
            });
        }

        if let Some(0) = self.extraction.min_name_match_length {
            return Err(ConfigError::Invalid {
                field: "extraction.min_name_match_length",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Effective fuzzy-match minimum given the catalog's own setting
    pub fn effective_min_name_length(&self, catalog_value: usize) -> usize {
        self.extraction
            .min_name_match_length
            .unwrap_or(catalog_value)
            .max(1)
    }
}

/// Minimum name length used when neither catalog nor configuration sets one
pub fn default_min_name_match_length() -> usize {
    extraction::DEFAULT_MIN_NAME_MATCH_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_parse_full_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            [logging]
            min_log_level = "debug"
            use_structured_logging = true

            [runner]
            max_workers = 3
            fail_on_policy_errors = true

            [extraction]
            min_name_match_length = 6

            [source]
            cache_ttl_seconds = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert!(config.logging.use_structured_logging);
        assert_eq!(config.runner.max_workers, 3);
        assert!(config.runner.fail_on_policy_errors);
        assert_eq!(config.effective_min_name_length(4), 6);
        assert_eq!(config.source.cache_ttl_seconds, 60);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("[runner]\nmax_workers = 2\n").unwrap();
        assert_eq!(config.runner.max_workers, 2);
        assert!(config.source.cache_ttl_seconds > 0);
    }

    #[test]
    fn test_invalid_worker_count_rejected() {
        let result = EngineConfig::from_toml_str("[runner]\nmax_workers = 0\n");
        assert_matches!(
            result,
            Err(ConfigError::Invalid {
                field: "runner.max_workers",
                ..
            })
        );
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = EngineConfig::from_toml_str("[runner\nmax_workers = ");
        assert_matches!(result, Err(ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runner]\nmax_workers = 5").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.runner.max_workers, 5);

        let missing = EngineConfig::load(Path::new("/nonexistent/psc.toml"));
        assert_matches!(missing, Err(ConfigError::Io { .. }));
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }
}
