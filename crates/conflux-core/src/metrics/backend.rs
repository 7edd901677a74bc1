use std::sync::Arc;

/// How a slot or a completion handle finished, for metrics classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran to completion.
    Success,
    /// Brought down by a failure cause.
    Failure,
    /// Stopped by a cancellation signal.
    Cancelled,
}

impl Outcome {
    /// Return label value for metrics.
    #[inline]
    pub fn as_label(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Cancelled => "cancelled",
        }
    }
}

/// Backend metrics collection interface.
///
/// All hooks receive the execution context name so backends can partition
/// series per logical operation.
pub trait MetricsBackend: Send + Sync + 'static {
    /// Record a source slot entering the active set of a merge.
    fn record_slot_started(&self, context: &str);

    /// Record a slot leaving the active set.
    ///
    /// # Arguments
    /// - `context`: Execution context name
    /// - `outcome`: How the slot retired
    /// - `items`: Items the slot forwarded downstream
    fn record_slot_finished(&self, context: &str, outcome: Outcome, items: u64);

    /// Record one item forwarded downstream by a merge.
    fn record_item_merged(&self, context: &str);

    /// Record a completion handle settling.
    fn record_handle_settled(&self, context: &str, outcome: Outcome);
}

/// Shared handle to a metrics backend.
///
/// Stored in [`crate::scheduler::Scheduler`] and cloned into each operation.
pub type MetricsHandle = Arc<dyn MetricsBackend>;
