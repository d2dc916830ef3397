//! Injected logging capability.
//!
//! Components never reach for a global logger. They hold a [`Log`] handle,
//! which either forwards to a [`Logger`] implementation or, when unset, drops
//! every message without formatting it.

use std::fmt;
use std::sync::Arc;

/// Sink for the three log levels used by the session driver.
pub trait Logger: Send + Sync {
    fn debug_log(&self, message: &str);
    fn info_log(&self, message: &str);
    fn error_log(&self, message: &str);
}

/// Cloneable handle to an optional [`Logger`].
#[derive(Clone, Default)]
pub struct Log {
    sink: Option<Arc<dyn Logger>>,
}

impl Log {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { sink: Some(logger) }
    }

    /// A handle that discards everything.
    pub fn silent() -> Self {
        Self { sink: None }
    }

    pub fn is_silent(&self) -> bool {
        self.sink.is_none()
    }

    pub fn debug(&self, message: impl fmt::Display) {
        if let Some(sink) = &self.sink {
            sink.debug_log(&message.to_string());
        }
    }

    pub fn info(&self, message: impl fmt::Display) {
        if let Some(sink) = &self.sink {
            sink.info_log(&message.to_string());
        }
    }

    pub fn error(&self, message: impl fmt::Display) {
        if let Some(sink) = &self.sink {
            sink.error_log(&message.to_string());
        }
    }
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("silent", &self.is_silent())
            .finish()
    }
}

/// Forwards log calls to `tracing` events under the `gantry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug_log(&self, message: &str) {
        tracing::debug!(target: "gantry", "{message}");
    }

    fn info_log(&self, message: &str) {
        tracing::info!(target: "gantry", "{message}");
    }

    fn error_log(&self, message: &str) {
        tracing::error!(target: "gantry", "{message}");
    }
}
