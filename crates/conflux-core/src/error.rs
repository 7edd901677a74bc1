use thiserror::Error;

/// Failure cause carried from a source or a suspended computation.
///
/// Producers are external collaborators; the core never inspects the cause
/// beyond logging and forwarding it once.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum HandleError {
    /// The suspension settled with a failure cause.
    #[error("suspension failed: {0}")]
    Failed(#[source] Cause),

    /// The handle was cancelled before the suspension settled.
    #[error("suspension was cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum MergeError {
    /// A source raised an error instead of yielding or finishing.
    ///
    /// `slot` is the source's submission index.
    #[error("merge source {slot} failed: {cause}")]
    SourceFailed {
        slot: usize,
        #[source]
        cause: Cause,
    },
}

impl MergeError {
    /// Submission index of the source that brought the merge down.
    pub fn slot(&self) -> usize {
        match self {
            MergeError::SourceFailed { slot, .. } => *slot,
        }
    }
}
