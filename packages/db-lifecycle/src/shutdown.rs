use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::{info, warn};

/// A cleanup action awaited at most once during process termination.
///
/// Actions run on the termination path and must not block indefinitely.
pub type ShutdownAction = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Process-wide shutdown collaborator consumed by the lifecycle base.
///
/// Injected rather than referenced globally so tests can substitute a fake
/// and assert exactly-once invocation.
pub trait ShutdownRegistry: Send + Sync {
    /// Register a named cleanup action.
    ///
    /// Re-registering an existing name replaces the previous action; the
    /// last registration wins.
    fn register(&self, name: &str, action: ShutdownAction);
}

/// Default registry: named actions, run once in registration order.
pub struct SignalRegistry {
    entries: Mutex<Vec<(String, ShutdownAction)>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Number of pending cleanup actions.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Await every registered action once, in registration order.
    ///
    /// Entries are drained before running, so a second call is a no-op and
    /// no action can ever run twice.
    pub async fn run(&self) {
        let entries = mem::take(&mut *self.entries.lock());
        for (name, action) in entries {
            action.await;
            info!(name = %name, "shutdown action completed");
        }
    }
}

impl Default for SignalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownRegistry for SignalRegistry {
    fn register(&self, name: &str, action: ShutdownAction) {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.iter_mut().find(|(existing, _)| existing == name) {
            warn!(name = %name, "shutdown action replaced");
            slot.1 = action;
        } else {
            entries.push((name.to_string(), action));
        }
    }
}

static DEFAULT_REGISTRY: Lazy<Arc<SignalRegistry>> =
    Lazy::new(|| Arc::new(SignalRegistry::new()));

/// Process-wide default registry used by the engine factories.
pub fn default_registry() -> Arc<SignalRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

/// Wait for ctrl-c, then run the default registry.
///
/// Spawn once from the host's main task; request-serving code never calls
/// this.
pub async fn run_on_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
    DEFAULT_REGISTRY.run().await;
}
