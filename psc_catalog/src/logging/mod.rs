//! Global logging module for the compliance engine
//!
//! Provides thread-safe global logging with per-policy context tagging and a
//! clean macro interface. Logging is optional: every macro is a silent no-op
//! until [`init_global_logging`] has been called.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
#[cfg(feature = "log-bridge")]
pub use service::FacadeLogger;
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();

/// Policy currently being evaluated on this thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyContext {
    pub policy_id: String,
    pub worker_id: usize,
}

thread_local! {
    static POLICY_CONTEXT: RefCell<Option<PolicyContext>> = RefCell::new(None);
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging system from the active preferences
pub fn init_global_logging() -> Result<(), String> {
    let logging_service = Arc::new(service::create_configured_service());

    GLOBAL_LOGGER
        .set(logging_service.clone())
        .map_err(|_| "Global logger already initialized".to_string())?;

    logging_service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Initialize with custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized".to_string())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some()
}

/// Safe access to global logger
pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

// ============================================================================
// POLICY CONTEXT MANAGEMENT
// ============================================================================

pub fn set_policy_context(policy_id: &str, worker_id: usize) {
    POLICY_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(PolicyContext {
            policy_id: policy_id.to_string(),
            worker_id,
        });
    });
}

pub fn clear_policy_context() {
    POLICY_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Execute function with policy context; the context is cleared even if `f` panics
pub fn with_policy_context<F, R>(policy_id: &str, worker_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    struct Reset;
    impl Drop for Reset {
        fn drop(&mut self) {
            clear_policy_context();
        }
    }

    set_policy_context(policy_id, worker_id);
    let _reset = Reset;
    f()
}

pub fn get_current_policy_context() -> Option<PolicyContext> {
    POLICY_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn attach_policy_context(mut event: LogEvent) -> LogEvent {
    if let Some(policy_ctx) = get_current_policy_context() {
        event = event.with_context("policy_id", &policy_ctx.policy_id);
        event = event.with_context("worker", &policy_ctx.worker_id.to_string());
    }
    event
}

/// Tag an event with the thread's policy context and log it
pub fn log_event_with_policy_context(event: LogEvent) {
    if let Some(logger) = try_get_global_logger() {
        logger.log_event(attach_policy_context(event));
    }
}

/// Log error with context (used by log_error! macro)
pub fn log_error_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::error(code, message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    log_event_with_policy_context(event);
}

/// Log success with context (used by log_success! macro)
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::success(code, message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    log_event_with_policy_context(event);
}

/// Log info with context (used by log_info! macro)
pub fn log_info_with_context(message: &str, context: Vec<(&str, &str)>) {
    let mut event = LogEvent::info(message);
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    log_event_with_policy_context(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_context_management() {
        assert!(get_current_policy_context().is_none());

        set_policy_context("pol-1", 3);
        let context = get_current_policy_context().unwrap();
        assert_eq!(context.policy_id, "pol-1");
        assert_eq!(context.worker_id, 3);

        clear_policy_context();
        assert!(get_current_policy_context().is_none());
    }

    #[test]
    fn test_with_policy_context() {
        let result = with_policy_context("pol-2", 0, || {
            let context = get_current_policy_context();
            assert_eq!(context.map(|c| c.policy_id), Some("pol-2".to_string()));
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_policy_context().is_none());
    }

    #[test]
    fn test_context_cleared_after_panic() {
        let outcome = std::panic::catch_unwind(|| {
            with_policy_context("pol-3", 1, || panic!("boom"));
        });
        assert!(outcome.is_err());
        assert!(get_current_policy_context().is_none());
    }

    #[test]
    fn test_macros_are_safe_without_initialization() {
        crate::log_info!("macro smoke test", "count" => 1);
        crate::log_warning!("warning smoke test");
        crate::log_debug!("debug smoke test", "key" => "value");
        crate::log_error!(codes::system::INTERNAL_ERROR, "error smoke test");
    }
}
