//! Output channel and task log.
//!
//! Service messages go to the output channel; leveled messages are task log
//! lines. [`ConsoleLog`] routes leveled messages through `tracing` and
//! writes service messages to stdout.

use crate::ServiceMessage;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};

/// Destination for task log lines and service messages.
pub trait Log: Send + Sync {
    fn verbose(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Appends a service message line to the output channel.
    fn write_service_message(&self, message: &ServiceMessage);
}

/// Log that writes service messages to stdout and everything else to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl ConsoleLog {
    pub fn new() -> Self {
        Self
    }
}

impl Log for ConsoleLog {
    fn verbose(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn write_service_message(&self, message: &ServiceMessage) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = writeln!(out, "{}", message) {
            tracing::error!(error = %e, "failed to write service message");
        }
    }
}

/// Log that keeps everything in memory.
///
/// Useful for asserting on emitted service messages and errors in tests.
///
/// # Example
///
/// ```
/// use azwebapp::log::{InMemoryLog, Log};
/// use azwebapp::ServiceMessage;
///
/// let log = InMemoryLog::new();
/// log.write_service_message(&ServiceMessage::new("ping"));
/// log.error("boom");
///
/// assert_eq!(log.standard_out(), vec!["##octopus[ping]".to_string()]);
/// assert_eq!(log.errors(), vec!["boom".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryLog {
    standard_out: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    messages: Mutex<Vec<ServiceMessage>>,
}

impl InMemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line written to the output channel, including leveled lines.
    pub fn standard_out(&self) -> Vec<String> {
        lock(&self.standard_out).clone()
    }

    /// Lines logged at error level.
    pub fn errors(&self) -> Vec<String> {
        lock(&self.errors).clone()
    }

    /// Service messages in the order they were written.
    pub fn service_messages(&self) -> Vec<ServiceMessage> {
        lock(&self.messages).clone()
    }

    fn push(&self, line: String) {
        lock(&self.standard_out).push(line);
    }
}

// A poisoned lock only means another test thread panicked mid-push.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Log for InMemoryLog {
    fn verbose(&self, message: &str) {
        self.push(message.to_string());
    }

    fn info(&self, message: &str) {
        self.push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.push(message.to_string());
    }

    fn error(&self, message: &str) {
        lock(&self.errors).push(message.to_string());
    }

    fn write_service_message(&self, message: &ServiceMessage) {
        self.push(message.to_string());
        lock(&self.messages).push(message.clone());
    }
}
