use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{error, info};

/// Leveled structured logger consumed by the lifecycle manager.
///
/// `data` is whatever identifying detail the call site attaches, most often
/// the data-source locator.
pub trait DbLogger: Send + Sync {
    fn info(&self, message: &str, data: &str);
    fn error(&self, message: &str, data: &str);
}

/// Default logger forwarding to the `tracing` macros.
pub struct TracingLogger;

impl DbLogger for TracingLogger {
    fn info(&self, message: &str, data: &str) {
        info!(data, "{message}");
    }

    fn error(&self, message: &str, data: &str) {
        error!(data, "{message}");
    }
}

static DEFAULT_LOGGER: Lazy<Arc<dyn DbLogger>> = Lazy::new(|| Arc::new(TracingLogger));

/// Process-wide default logger, bound when a config carries none.
pub fn default_logger() -> Arc<dyn DbLogger> {
    Arc::clone(&DEFAULT_LOGGER)
}
