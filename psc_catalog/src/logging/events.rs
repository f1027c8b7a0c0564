//! Event system for engine logging

use super::codes::Code;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Core log event structure
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    fn with_level(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            code,
            message: message.to_string(),
            context: BTreeMap::new(),
        }
    }

    /// Create a new error event
    pub fn error(error_code: Code, message: &str) -> Self {
        Self::with_level(LogLevel::Error, error_code, message)
    }

    /// Create a new warning event (warnings may not have codes)
    pub fn warning(message: &str) -> Self {
        Self::with_level(LogLevel::Warning, Code::new("W000"), message)
    }

    /// Create warning with specific code
    pub fn warning_with_code(warning_code: Code, message: &str) -> Self {
        Self::with_level(LogLevel::Warning, warning_code, message)
    }

    /// Create a new info event
    pub fn info(message: &str) -> Self {
        Self::with_level(LogLevel::Info, Code::new("I000"), message)
    }

    /// Create a success event (info with success code)
    pub fn success(success_code: Code, message: &str) -> Self {
        Self::with_level(LogLevel::Info, success_code, message)
    }

    /// Create a debug event
    pub fn debug(message: &str) -> Self {
        Self::with_level(LogLevel::Debug, Code::new("D000"), message)
    }

    /// Add context data
    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    pub fn is_info(&self) -> bool {
        self.level == LogLevel::Info
    }

    pub fn is_debug(&self) -> bool {
        self.level == LogLevel::Debug
    }

    /// Get severity from error code
    pub fn severity(&self) -> &'static str {
        super::codes::get_severity(self.code.as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        super::codes::get_category(self.code.as_str())
    }

    pub fn description(&self) -> &'static str {
        super::codes::get_description(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        super::codes::get_action(self.code.as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        super::codes::is_recoverable(self.code.as_str())
    }

    /// Format for display
    pub fn format(&self) -> String {
        let mut line = format!(
            "[{}] {} - {}",
            self.level.as_str(),
            self.code.as_str(),
            self.message
        );

        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            line.push_str(&format!(" ({})", pairs.join(", ")));
        }

        line
    }

    /// One JSON object per event for structured logging
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let recoverable = self.is_error().then(|| self.is_recoverable());
        serde_json::to_string(&JsonEvent {
            timestamp: self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level: self.level.as_str(),
            code: self.code.as_str(),
            message: &self.message,
            category: self.category(),
            severity: self.severity(),
            recoverable,
            description: recoverable.map(|_| self.description()),
            action: recoverable.map(|_| self.recommended_action()),
            context: &self.context,
        })
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    timestamp: String,
    level: &'static str,
    code: &'static str,
    message: &'a str,
    category: &'static str,
    severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recoverable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'static str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    context: &'a BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_error_event_creation() {
        let event = LogEvent::error(codes::catalog::CATALOG_READ_FAILURE, "Catalog not found");

        assert!(event.is_error());
        assert_eq!(event.code.as_str(), "E010");
        assert_eq!(event.category(), "Catalog");
    }

    #[test]
    fn test_event_with_context() {
        let event = LogEvent::error(codes::catalog::OPERATOR_SHAPE_MISMATCH, "Bad shape")
            .with_context("requirement_id", "REQ-1")
            .with_context("operator", "numeric_range");

        assert_eq!(
            event.context.get("requirement_id"),
            Some(&"REQ-1".to_string())
        );
        assert!(event.format().contains("operator=numeric_range"));
    }

    #[test]
    fn test_event_formatting() {
        let event = LogEvent::success(codes::success::RUN_COMPLETED, "Run finished");
        let formatted = event.format();

        assert!(formatted.contains("[INFO]"));
        assert!(formatted.contains("I041"));
        assert_eq!(event.category(), "Success");
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::error(codes::extraction::PAYLOAD_UNPARSEABLE, "Bad payload")
            .with_context("policy_id", "pol-1");

        let json = event.format_json().unwrap();
        assert!(json.contains("\"level\":\"ERROR\""));
        assert!(json.contains("\"code\":\"E040\""));
        assert!(json.contains("\"policy_id\":\"pol-1\""));
        assert!(json.contains("\"recoverable\""));

        let info = LogEvent::info("plain").format_json().unwrap();
        assert!(!info.contains("context"));
        assert!(!info.contains("recoverable"));
    }
}
