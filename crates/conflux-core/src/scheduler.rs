use std::fmt;
use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::metrics::{MetricsHandle, noop_metrics};

/// Explicit executor handle passed into bridge and merge operations.
///
/// Wraps a caller-owned runtime handle; nothing in this crate spawns on an
/// ambient global, so the runtime's lifecycle stays with whoever built it.
/// The scheduler also carries the shared metrics backend injected at setup
/// time.
#[derive(Clone)]
pub struct Scheduler {
    handle: Handle,
    metrics: MetricsHandle,
}

impl Scheduler {
    /// Wrap an explicit runtime handle with no-op metrics.
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            metrics: noop_metrics(),
        }
    }

    /// Wrap the runtime of the calling task.
    ///
    /// Panics outside a runtime, same as [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Replace the metrics backend and return the updated scheduler.
    pub fn with_metrics(mut self, metrics: MetricsHandle) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get a clonable handle to the metrics backend.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("handle", &"<runtime>")
            .field("metrics", &"<handle>")
            .finish()
    }
}
