use std::fmt;
use std::sync::Arc;

const SEPARATOR: char = ':';

/// Hierarchical logging handle.
///
/// A logger is nothing more than a scope path such as `Driver:ninja-serial`.
/// Every message is forwarded to [`tracing`] with the path attached as the
/// `scope` field, so subscribers can filter on it.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Logger {
    scope: Arc<str>,
}

impl Logger {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: Arc::from(scope.into()),
        }
    }

    /// Create a sub-logger scoped under `name`.
    pub fn extend(&self, name: &str) -> Self {
        if self.scope.is_empty() {
            return Self::new(name);
        }
        Self::new(format!("{}{SEPARATOR}{name}", self.scope))
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn trace(&self, message: impl fmt::Display) {
        tracing::trace!(scope = %self.scope, "{message}");
    }

    pub fn debug(&self, message: impl fmt::Display) {
        tracing::debug!(scope = %self.scope, "{message}");
    }

    pub fn info(&self, message: impl fmt::Display) {
        tracing::info!(scope = %self.scope, "{message}");
    }

    pub fn warn(&self, message: impl fmt::Display) {
        tracing::warn!(scope = %self.scope, "{message}");
    }

    pub fn error(&self, message: impl fmt::Display) {
        tracing::error!(scope = %self.scope, "{message}");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Logger").field(&self.scope()).finish()
    }
}

impl fmt::Display for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope)
    }
}
