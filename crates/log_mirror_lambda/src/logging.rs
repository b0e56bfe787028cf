use std::sync::OnceLock;

use serde_json::{json, Value};

static MINIMUM_LEVEL: OnceLock<LogLevel> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Accepts the level names the job has historically been configured
    /// with, case-insensitively. `WARNING` and `WARN` are synonyms.
    pub fn parse(value: &str) -> Option<LogLevel> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" | "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig {
    pub minimum_level: LogLevel,
}

/// Stores the minimum emitted level for the rest of the process lifetime.
/// Called once from `main`; later calls keep the first configuration.
pub fn init_logging(config: LoggingConfig) {
    let _ = MINIMUM_LEVEL.set(config.minimum_level);
}

fn configured_level() -> LogLevel {
    *MINIMUM_LEVEL.get().unwrap_or(&LogLevel::Info)
}

fn emits_at(level: LogLevel, minimum_level: LogLevel) -> bool {
    level >= minimum_level
}

pub fn log_debug(component: &str, event: &str, details: Value) {
    log_event(LogLevel::Debug, component, event, details);
}

pub fn log_info(component: &str, event: &str, details: Value) {
    log_event(LogLevel::Info, component, event, details);
}

pub fn log_warn(component: &str, event: &str, details: Value) {
    log_event(LogLevel::Warn, component, event, details);
}

pub fn log_error(component: &str, event: &str, details: Value) {
    log_event(LogLevel::Error, component, event, details);
}

fn log_event(level: LogLevel, component: &str, event: &str, details: Value) {
    if !emits_at(level, configured_level()) {
        return;
    }

    eprintln!(
        "{}",
        json!({
            "component": component,
            "level": level.as_str(),
            "event": event,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "details": details,
        })
    );
}
