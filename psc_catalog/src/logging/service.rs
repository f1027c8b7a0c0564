//! Logging service implementation

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use std::sync::{Arc, Mutex};

/// Simple logger trait
pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Main logging service with configuration awareness
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Create service from the active logging preferences
    pub fn with_config() -> Self {
        let min_level = config::get_min_log_level();
        let logger: Arc<dyn Logger> = if config::forward_to_log_facade() {
            facade_or_console(min_level)
        } else if config::use_structured_logging() {
            Arc::new(StructuredLogger::new(min_level))
        } else {
            Arc::new(ConsoleLogger::new(min_level))
        };

        Self::new(logger, min_level)
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    pub fn log_event(&self, event: LogEvent) {
        if self.should_log(event.level) {
            self.logger.log(&event);
        }
    }

    pub fn log_error(&self, error_code: Code, message: &str) {
        self.log_event(LogEvent::error(error_code, message));
    }

    pub fn log_success(&self, success_code: Code, message: &str) {
        self.log_event(LogEvent::success(success_code, message));
    }

    pub fn log_info(&self, message: &str) {
        self.log_event(LogEvent::info(message));
    }

    pub fn log_warning(&self, message: &str) {
        self.log_event(LogEvent::warning(message));
    }
}

#[cfg(feature = "log-bridge")]
fn facade_or_console(_min_level: LogLevel) -> Arc<dyn Logger> {
    Arc::new(FacadeLogger::new())
}

#[cfg(not(feature = "log-bridge"))]
fn facade_or_console(min_level: LogLevel) -> Arc<dyn Logger> {
    Arc::new(ConsoleLogger::new(min_level))
}

/// Build the service used by `init_global_logging`
pub fn create_configured_service() -> LoggingService {
    LoggingService::with_config()
}

/// Simple console logger
pub struct ConsoleLogger {
    min_level: LogLevel,
}

impl ConsoleLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        if event.level <= self.min_level {
            match event.level {
                LogLevel::Error => eprintln!("{}", event.format()),
                _ => println!("{}", event.format()),
            }
        }
    }
}

/// Structured logger emitting one JSON object per line
pub struct StructuredLogger {
    min_level: LogLevel,
}

impl StructuredLogger {
    pub fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }
}

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        if event.level > self.min_level {
            return;
        }
        let line = event.format_json().unwrap_or_else(|_| event.format());
        match event.level {
            LogLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

/// Forwards events to the `log` crate facade so binaries can pick the backend
#[cfg(feature = "log-bridge")]
pub struct FacadeLogger {
    target: &'static str,
}

#[cfg(feature = "log-bridge")]
impl FacadeLogger {
    pub fn new() -> Self {
        Self { target: "psc" }
    }

    pub fn with_target(target: &'static str) -> Self {
        Self { target }
    }
}

#[cfg(feature = "log-bridge")]
impl Default for FacadeLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "log-bridge")]
impl Logger for FacadeLogger {
    fn log(&self, event: &LogEvent) {
        let level = match event.level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        };
        log::log!(target: self.target, level, "{}", event.format());
    }
}

/// Memory logger for testing
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn with_events<R>(&self, f: impl FnOnce(&mut Vec<LogEvent>) -> R) -> R {
        match self.events.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    pub fn get_events(&self) -> Vec<LogEvent> {
        self.with_events(|events| events.clone())
    }

    pub fn clear(&self) {
        self.with_events(|events| events.clear());
    }

    pub fn event_count(&self) -> usize {
        self.with_events(|events| events.len())
    }

    pub fn get_errors(&self) -> Vec<LogEvent> {
        self.with_events(|events| events.iter().filter(|e| e.is_error()).cloned().collect())
    }

    pub fn has_error_with_code(&self, code: Code) -> bool {
        self.with_events(|events| events.iter().any(|e| e.is_error() && e.code == code))
    }

    pub fn has_success_with_code(&self, code: Code) -> bool {
        self.with_events(|events| events.iter().any(|e| e.is_info() && e.code == code))
    }
}

impl Default for MemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        self.with_events(|events| events.push(event.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_memory_logger() {
        let logger = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(logger.clone(), LogLevel::Debug);

        service.log_error(codes::catalog::CATALOG_PARSE_FAILURE, "bad catalog");
        service.log_success(codes::success::CATALOG_COMPILED, "compiled");
        service.log_info("info");

        assert_eq!(logger.event_count(), 3);
        assert!(logger.has_error_with_code(codes::catalog::CATALOG_PARSE_FAILURE));
        assert!(logger.has_success_with_code(codes::success::CATALOG_COMPILED));
        assert_eq!(logger.get_errors().len(), 1);

        logger.clear();
        assert_eq!(logger.event_count(), 0);
    }

    #[test]
    fn test_level_filtering() {
        let logger = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(logger.clone(), LogLevel::Warning);

        service.log_info("dropped");
        service.log_warning("kept");
        service.log_error(codes::system::INTERNAL_ERROR, "kept");

        assert_eq!(logger.event_count(), 2);
        assert!(service.should_log(LogLevel::Error));
        assert!(!service.should_log(LogLevel::Debug));
    }
}
