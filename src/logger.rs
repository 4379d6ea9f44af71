//! Sink for non-fatal diagnostics.

use std::cell::RefCell;

use tracing::warn;

pub trait Logger {
    fn warning(&self, message: &str);
}

/// Forwards warnings to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn warning(&self, message: &str) {
        warn!("{message}");
    }
}

/// Keeps every warning, for callers that want to inspect or count them.
#[derive(Debug, Default)]
pub struct CollectingLogger {
    messages: RefCell<Vec<String>>,
}

impl CollectingLogger {
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl Logger for CollectingLogger {
    fn warning(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
