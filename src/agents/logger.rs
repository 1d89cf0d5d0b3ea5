//! Logging capability handed to steps, the retry wrapper and the orchestrator.
//!
//! Components receive an `Arc<dyn StepLogger>` instead of calling the global
//! subscriber, so tests can capture what a run reported.

use std::sync::{Arc, Mutex};

/// Severity of a recorded log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink for step-scoped diagnostics. `step` names the emitting component.
pub trait StepLogger: Send + Sync {
    fn log(&self, level: LogLevel, step: &str, message: &str);

    fn debug(&self, step: &str, message: &str) {
        self.log(LogLevel::Debug, step, message);
    }

    fn info(&self, step: &str, message: &str) {
        self.log(LogLevel::Info, step, message);
    }

    fn warn(&self, step: &str, message: &str) {
        self.log(LogLevel::Warn, step, message);
    }

    fn error(&self, step: &str, message: &str) {
        self.log(LogLevel::Error, step, message);
    }
}

/// Forwards to `tracing` with the step recorded in the `agent` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn shared() -> Arc<dyn StepLogger> {
        Arc::new(TracingLogger)
    }
}

impl StepLogger for TracingLogger {
    fn log(&self, level: LogLevel, step: &str, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(agent = step, "{}", message),
            LogLevel::Info => tracing::info!(agent = step, "{}", message),
            LogLevel::Warn => tracing::warn!(agent = step, "{}", message),
            LogLevel::Error => tracing::error!(agent = step, "{}", message),
        }
    }
}

/// A line captured by [`MemoryLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub step: String,
    pub message: String,
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Whether any line at `level` contains `needle`.
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|r| r.level == level && r.message.contains(needle))
    }
}

impl StepLogger for MemoryLogger {
    fn log(&self, level: LogLevel, step: &str, message: &str) {
        if let Ok(mut records) = self.records.lock() {
            records.push(LogRecord {
                level,
                step: step.to_string(),
                message: message.to_string(),
            });
        }
    }
}
