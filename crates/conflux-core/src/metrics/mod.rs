//! Metrics collection abstraction for merge and bridge operations.
//!
//! Backends (prometheus, statsd, etc) implement [`MetricsBackend`] and are
//! injected via [`crate::scheduler::Scheduler`]; everything started through
//! that scheduler reports into the same handle.
mod backend;
pub use backend::{MetricsBackend, MetricsHandle, Outcome};

mod noop;
pub use noop::NoOpMetrics;

use std::sync::Arc;

/// Create a no-op metrics handle.
#[inline]
pub fn noop_metrics() -> MetricsHandle {
    Arc::new(NoOpMetrics)
}
